use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use bytes::Bytes;
use ziprun_core::{Effect, Msg, StreamSignal, SubmissionError};
use ziprun_engine::{
    CandidateUpload, EngineEvent, EngineHandle, EngineSettings, LineKind, SubmitError,
    SubmitFailureKind,
};
use ziprun_logging::{ziprun_info, ziprun_warn};

/// Turns core effects into engine commands and engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            engine: EngineHandle::new(settings),
        }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::OpenStream { run_id } => {
                    ziprun_info!("OpenStream run_id={}", run_id);
                    self.engine.open_stream(run_id);
                }
                Effect::CloseStream { run_id } => {
                    ziprun_info!("CloseStream run_id={}", run_id);
                    self.engine.close_stream(run_id);
                }
                Effect::Submit { run_id, file } => {
                    ziprun_info!(
                        "Submit run_id={} name={} size={}",
                        run_id,
                        file.name,
                        file.size_bytes
                    );
                    self.engine.submit(
                        run_id,
                        CandidateUpload {
                            name: file.name,
                            content: Bytes::from_owner(file.content),
                        },
                    );
                }
                Effect::Retrieve { filename } => {
                    ziprun_info!("Retrieve filename={}", filename);
                    self.engine.retrieve(filename);
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next_event(&self, timeout: Duration) -> Result<EngineEvent, RecvTimeoutError> {
        self.engine.recv_timeout(timeout)
    }
}

/// `None` for events the state machine has no message for.
pub fn map_event(event: EngineEvent) -> Option<Msg> {
    let msg = match event {
        EngineEvent::StreamLine { run_id, line } => Msg::StreamLine {
            run_id,
            signal: map_kind(line.kind),
            line: line.raw,
        },
        EngineEvent::StreamFailed { run_id, error } => Msg::StreamDisconnected {
            run_id,
            reason: error.to_string(),
        },
        EngineEvent::SubmitCompleted { run_id, result } => match result {
            Ok(accepted) => Msg::SubmissionAccepted {
                run_id,
                result_filename: accepted.result_filename,
            },
            Err(error) => Msg::SubmissionFailed {
                run_id,
                error: map_submit_error(error),
            },
        },
        EngineEvent::RetrieveCompleted { filename, result } => match result {
            Ok(path) => Msg::RetrievalSaved {
                filename,
                path: path.display().to_string(),
            },
            Err(error) => {
                ziprun_warn!("Retrieval of {} failed: {}", filename, error);
                Msg::RetrievalFailed {
                    filename,
                    message: error.to_string(),
                }
            }
        },
        EngineEvent::EngineFailed { .. } => return None,
    };
    Some(msg)
}

fn map_kind(kind: LineKind) -> StreamSignal {
    match kind {
        LineKind::Informational => StreamSignal::Informational,
        LineKind::Completed => StreamSignal::Completed,
        LineKind::Failed => StreamSignal::Failed,
    }
}

fn map_submit_error(error: SubmitError) -> SubmissionError {
    match error.kind {
        SubmitFailureKind::Rejected => SubmissionError::Rejected {
            message: error.message,
        },
        _ => SubmissionError::Transport {
            message: error.to_string(),
        },
    }
}
