use chrono::Local;
use ziprun_core::{AppViewModel, RunState};

/// Prints view model changes as plain terminal lines.
///
/// The log is append-only between clears, so only lines past the last printed
/// index are emitted. A shorter log than last time means it was cleared.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    printed_log_lines: usize,
    last_file_info: Option<String>,
    last_status: Option<String>,
    timestamps: bool,
}

impl TerminalRenderer {
    pub fn with_timestamps() -> Self {
        Self {
            timestamps: true,
            ..Self::default()
        }
    }

    pub fn render(&mut self, view: &AppViewModel) -> Vec<String> {
        let mut out = Vec::new();

        if view.file_info != self.last_file_info {
            if let Some(info) = &view.file_info {
                out.push(info.clone());
            }
            self.last_file_info = view.file_info.clone();
        }

        if view.log_lines.len() < self.printed_log_lines {
            self.printed_log_lines = 0;
        }
        for line in &view.log_lines[self.printed_log_lines..] {
            out.push(self.stamp(line));
        }
        self.printed_log_lines = view.log_lines.len();

        let status = status_line(view);
        if self.last_status.as_ref() != Some(&status) {
            out.push(status.clone());
            self.last_status = Some(status);
        }
        out
    }

    fn stamp(&self, line: &str) -> String {
        if self.timestamps {
            format!("{} {}", Local::now().format("%H:%M:%S"), line)
        } else {
            line.to_string()
        }
    }
}

fn status_line(view: &AppViewModel) -> String {
    let mut status = format!("[{}]", run_state_label(&view.run_state));
    if view.busy {
        status.push_str(" working...");
    }
    if view.retrieval_enabled {
        if let Some(name) = &view.result_filename {
            status.push_str(&format!(" result ready: {name}"));
        }
    }
    status
}

fn run_state_label(state: &RunState) -> &'static str {
    match state {
        RunState::Idle => "idle",
        RunState::SubmittingAndStreaming => "uploading",
        RunState::Submitting => "waiting for upload",
        RunState::Streaming => "processing",
        RunState::Succeeded { .. } => "done",
        RunState::Failed { .. } => "failed",
    }
}
