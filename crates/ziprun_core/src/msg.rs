use std::sync::Arc;

use crate::RunId;

/// Classification of a progress line, as reported by the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSignal {
    Informational,
    Completed,
    Failed,
}

/// Why an upload did not yield a result filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// The server answered with a non-success status.
    Rejected { message: String },
    /// The request failed or the response could not be understood.
    Transport { message: String },
}

impl SubmissionError {
    pub fn log_line(&self) -> String {
        match self {
            SubmissionError::Rejected { message } => format!("Server error: {message}"),
            SubmissionError::Transport { message } => format!("Upload failed: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked or dropped a file.
    FileSelected {
        name: String,
        size_bytes: u64,
        content: Arc<[u8]>,
    },
    /// User clicked Start processing.
    StartClicked,
    /// User clicked Clear log.
    ClearLogClicked,
    /// User clicked Download result.
    RetrieveClicked,
    /// Progress stream delivered a line.
    StreamLine {
        run_id: RunId,
        line: String,
        signal: StreamSignal,
    },
    /// Progress stream connection failed or dropped.
    StreamDisconnected { run_id: RunId, reason: String },
    /// Upload accepted by the server.
    SubmissionAccepted {
        run_id: RunId,
        result_filename: String,
    },
    /// Upload failed.
    SubmissionFailed {
        run_id: RunId,
        error: SubmissionError,
    },
    /// Result artifact was written to disk.
    RetrievalSaved { filename: String, path: String },
    /// Result artifact could not be fetched.
    RetrievalFailed { filename: String, message: String },
    /// Fallback for placeholder wiring.
    NoOp,
}
