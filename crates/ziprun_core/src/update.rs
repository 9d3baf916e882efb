use ziprun_logging::ziprun_debug;

use crate::selection::{select_file, Selection};
use crate::state::{StreamOutcome, UploadOutcome};
use crate::{AppState, Effect, Msg, RunId, StreamSignal, SubmissionError, STREAM_DISCONNECTED_LINE};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected {
            name,
            size_bytes,
            content,
        } => {
            match select_file(&name, size_bytes, content) {
                Selection::Accepted { file, descriptor } => {
                    state.apply_selection(Some(file), descriptor)
                }
                Selection::Rejected { descriptor } => state.apply_selection(None, descriptor),
            }
            Vec::new()
        }
        Msg::StartClicked => {
            if !state.start_enabled() {
                return (state, Vec::new());
            }
            let Some(file) = state.candidate().cloned() else {
                return (state, Vec::new());
            };
            let mut effects = Vec::new();
            if let Some(previous) = state.open_stream_run() {
                ziprun_debug!("Closing stream of superseded run {}", previous);
                effects.push(Effect::CloseStream { run_id: previous });
            }
            let run_id = state.begin_run();
            effects.push(Effect::OpenStream { run_id });
            effects.push(Effect::Submit { run_id, file });
            effects
        }
        Msg::ClearLogClicked => {
            state.clear_log();
            Vec::new()
        }
        Msg::RetrieveClicked => match state.result() {
            Some(handle) if state.retrieval_enabled() => vec![Effect::Retrieve {
                filename: handle.filename.clone(),
            }],
            _ => Vec::new(),
        },
        Msg::StreamLine {
            run_id,
            line,
            signal,
        } => {
            apply_stream_line(&mut state, run_id, line, signal);
            Vec::new()
        }
        Msg::StreamDisconnected { run_id, reason } => {
            if stream_is_open(&mut state, run_id) {
                ziprun_debug!("Run {} stream disconnected: {}", run_id, reason);
                state.push_log(STREAM_DISCONNECTED_LINE);
                fail_stream(&mut state, run_id, STREAM_DISCONNECTED_LINE.to_string());
            }
            Vec::new()
        }
        Msg::SubmissionAccepted {
            run_id,
            result_filename,
        } => {
            apply_submission_accepted(&mut state, run_id, result_filename);
            Vec::new()
        }
        Msg::SubmissionFailed { run_id, error } => {
            apply_submission_failed(&mut state, run_id, error)
        }
        Msg::RetrievalSaved { filename, path } => {
            ziprun_debug!("Result {} saved to {}", filename, path);
            state.push_log(format!("Saved result to {path}"));
            Vec::new()
        }
        Msg::RetrievalFailed { filename, message } => {
            ziprun_debug!("Result {} could not be retrieved: {}", filename, message);
            state.push_log(format!("Download failed: {message}"));
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn stream_is_open(state: &mut AppState, run_id: RunId) -> bool {
    match state.run_mut(run_id) {
        Some(run) => run.stream == StreamOutcome::Open,
        None => {
            ziprun_debug!("Ignoring stream event for stale run {}", run_id);
            false
        }
    }
}

fn apply_stream_line(state: &mut AppState, run_id: RunId, line: String, signal: StreamSignal) {
    // Only the first terminal line counts; anything after it is dropped.
    if !stream_is_open(state, run_id) {
        return;
    }
    state.push_log(line.clone());
    match signal {
        StreamSignal::Informational => {}
        StreamSignal::Completed => {
            if let Some(run) = state.run_mut(run_id) {
                run.stream = StreamOutcome::Succeeded;
            }
        }
        StreamSignal::Failed => fail_stream(state, run_id, line),
    }
}

fn fail_stream(state: &mut AppState, run_id: RunId, reason: String) {
    if let Some(run) = state.run_mut(run_id) {
        run.stream = StreamOutcome::Failed;
        run.failure.get_or_insert(reason);
    }
}

fn apply_submission_accepted(state: &mut AppState, run_id: RunId, result_filename: String) {
    let Some(run) = state.run_mut(run_id) else {
        ziprun_debug!("Ignoring upload result for stale run {}", run_id);
        return;
    };
    if run.upload != UploadOutcome::Pending {
        return;
    }
    run.upload = UploadOutcome::Accepted(result_filename.clone());
    if run.superseded {
        ziprun_debug!("Run {} result discarded after a newer selection", run_id);
        state.mark_dirty();
    } else {
        state.store_result(result_filename);
    }
}

fn apply_submission_failed(
    state: &mut AppState,
    run_id: RunId,
    error: SubmissionError,
) -> Vec<Effect> {
    let Some(run) = state.run_mut(run_id) else {
        ziprun_debug!("Ignoring upload failure for stale run {}", run_id);
        return Vec::new();
    };
    if run.upload != UploadOutcome::Pending {
        return Vec::new();
    }
    let line = error.log_line();
    run.upload = UploadOutcome::Failed;
    run.failure.get_or_insert(line.clone());
    let close_stream = run.stream == StreamOutcome::Open;
    if close_stream {
        run.stream = StreamOutcome::Aborted;
    }
    state.push_log(line);
    if close_stream {
        vec![Effect::CloseStream { run_id }]
    } else {
        Vec::new()
    }
}
