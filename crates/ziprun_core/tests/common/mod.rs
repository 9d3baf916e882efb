#![allow(dead_code)]

use std::sync::{Arc, Once};

use ziprun_core::{update, AppState, Effect, Msg, RunId, StreamSignal};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(ziprun_logging::initialize_for_tests);
}

pub fn select(state: AppState, name: &str, size_bytes: u64) -> AppState {
    let (state, effects) = update(
        state,
        Msg::FileSelected {
            name: name.to_string(),
            size_bytes,
            content: Arc::from(b"PK\x03\x04".to_vec()),
        },
    );
    assert!(effects.is_empty());
    state
}

pub fn start(state: AppState) -> (AppState, RunId) {
    let (state, effects) = update(state, Msg::StartClicked);
    let run_id = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::OpenStream { run_id } => Some(*run_id),
            _ => None,
        })
        .expect("open stream effect");
    (state, run_id)
}

pub fn line(state: AppState, run_id: RunId, text: &str, signal: StreamSignal) -> AppState {
    let (state, effects) = update(
        state,
        Msg::StreamLine {
            run_id,
            line: text.to_string(),
            signal,
        },
    );
    assert!(effects.is_empty());
    state
}

pub fn accepted(state: AppState, run_id: RunId, result_filename: &str) -> AppState {
    let (state, effects) = update(
        state,
        Msg::SubmissionAccepted {
            run_id,
            result_filename: result_filename.to_string(),
        },
    );
    assert!(effects.is_empty());
    state
}

/// Selects `archive.zip`, starts a run and lets both signals succeed.
pub fn succeeded_run() -> (AppState, RunId) {
    let state = select(AppState::new(), "archive.zip", 2048);
    let (state, run_id) = start(state);
    let state = line(state, run_id, "Processing finished", StreamSignal::Completed);
    (accepted(state, run_id, "out.zip"), run_id)
}
