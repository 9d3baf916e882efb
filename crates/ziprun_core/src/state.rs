use std::sync::Arc;

use crate::view_model::AppViewModel;

pub type RunId = u64;

/// Appended when the progress stream drops before a terminal line arrived.
pub const STREAM_DISCONNECTED_LINE: &str = "Error: connection to the log stream failed";

/// A validated archive waiting to be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    pub size_bytes: u64,
    pub content: Arc<[u8]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub raw: String,
}

/// Name of the artifact the server produced for the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultHandle {
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    /// Upload in flight and progress stream open.
    SubmittingAndStreaming,
    /// Stream reported completion; upload response still outstanding.
    Submitting,
    /// Upload accepted; waiting for a terminal progress line.
    Streaming,
    Succeeded {
        result_filename: String,
    },
    Failed {
        reason: String,
    },
}

impl RunState {
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            RunState::SubmittingAndStreaming | RunState::Streaming
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StreamOutcome {
    Open,
    Succeeded,
    Failed,
    /// Closed by the client after the upload failed.
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UploadOutcome {
    Pending,
    Accepted(String),
    Failed,
}

/// Tracks both completion signals of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Run {
    pub(crate) id: RunId,
    pub(crate) stream: StreamOutcome,
    pub(crate) upload: UploadOutcome,
    /// First failure reported by either signal.
    pub(crate) failure: Option<String>,
    /// A newer selection happened while this run was busy.
    pub(crate) superseded: bool,
}

impl Run {
    fn new(id: RunId) -> Self {
        Self {
            id,
            stream: StreamOutcome::Open,
            upload: UploadOutcome::Pending,
            failure: None,
            superseded: false,
        }
    }

    fn state(&self) -> RunState {
        if let Some(reason) = &self.failure {
            return RunState::Failed {
                reason: reason.clone(),
            };
        }
        match (&self.stream, &self.upload) {
            (StreamOutcome::Open, UploadOutcome::Pending) => RunState::SubmittingAndStreaming,
            (StreamOutcome::Open, UploadOutcome::Accepted(_)) => RunState::Streaming,
            (StreamOutcome::Succeeded, UploadOutcome::Pending) => RunState::Submitting,
            (StreamOutcome::Succeeded, UploadOutcome::Accepted(_)) if self.superseded => {
                RunState::Idle
            }
            (StreamOutcome::Succeeded, UploadOutcome::Accepted(filename)) => {
                RunState::Succeeded {
                    result_filename: filename.clone(),
                }
            }
            // Every failing combination records `failure` first.
            _ => RunState::Failed {
                reason: String::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    next_run_id: RunId,
    candidate: Option<CandidateFile>,
    file_info: Option<String>,
    run: Option<Run>,
    result: Option<ResultHandle>,
    log: Vec<LogLine>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let run_state = self.run_state();
        AppViewModel {
            busy: run_state.is_busy(),
            start_enabled: self.start_enabled(),
            retrieval_enabled: self.retrieval_enabled(),
            run_state,
            file_info: self.file_info.clone(),
            log_lines: self.log.iter().map(|line| line.raw.clone()).collect(),
            result_filename: self.result.as_ref().map(|r| r.filename.clone()),
            dirty: self.dirty,
        }
    }

    pub fn run_state(&self) -> RunState {
        self.run.as_ref().map(Run::state).unwrap_or_default()
    }

    pub fn is_busy(&self) -> bool {
        self.run_state().is_busy()
    }

    /// A newer selection re-enables start even while the old run is still busy.
    pub fn start_enabled(&self) -> bool {
        self.candidate.is_some() && (!self.is_busy() || self.run_superseded())
    }

    /// Retrieval needs both the upload's result name and the stream's completion.
    pub fn retrieval_enabled(&self) -> bool {
        self.result.is_some()
            && self
                .run
                .as_ref()
                .is_some_and(|run| run.stream == StreamOutcome::Succeeded)
    }

    pub fn candidate(&self) -> Option<&CandidateFile> {
        self.candidate.as_ref()
    }

    pub fn result(&self) -> Option<&ResultHandle> {
        self.result.as_ref()
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn push_log(&mut self, raw: impl Into<String>) {
        self.log.push(LogLine { raw: raw.into() });
        self.mark_dirty();
    }

    pub(crate) fn clear_log(&mut self) {
        if !self.log.is_empty() {
            self.log.clear();
            self.mark_dirty();
        }
    }

    fn run_superseded(&self) -> bool {
        self.run.as_ref().is_some_and(|run| run.superseded)
    }

    /// The current run, if its progress stream is still open.
    pub(crate) fn open_stream_run(&self) -> Option<RunId> {
        self.run
            .as_ref()
            .filter(|run| run.stream == StreamOutcome::Open)
            .map(|run| run.id)
    }

    /// Applies a new selection outcome. A busy run keeps going but loses its result.
    pub(crate) fn apply_selection(&mut self, candidate: Option<CandidateFile>, info: String) {
        self.candidate = candidate;
        self.file_info = Some(info);
        self.result = None;
        if self.is_busy() {
            if let Some(run) = self.run.as_mut() {
                run.superseded = true;
            }
        } else {
            self.run = None;
        }
        self.mark_dirty();
    }

    /// Starts a new run for the current candidate and returns its id.
    pub(crate) fn begin_run(&mut self) -> RunId {
        self.next_run_id += 1;
        let id = self.next_run_id;
        self.log.clear();
        self.result = None;
        self.run = Some(Run::new(id));
        self.mark_dirty();
        id
    }

    /// The run addressed by an engine message, if it is current.
    pub(crate) fn run_mut(&mut self, run_id: RunId) -> Option<&mut Run> {
        self.run.as_mut().filter(|run| run.id == run_id)
    }

    pub(crate) fn store_result(&mut self, filename: String) {
        self.result = Some(ResultHandle { filename });
        self.mark_dirty();
    }
}
