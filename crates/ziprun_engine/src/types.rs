use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;

pub type RunId = u64;

/// Archive payload handed to the submission channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateUpload {
    pub name: String,
    pub content: Bytes,
}

/// Successful `/process` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub result_filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Informational,
    Completed,
    Failed,
}

impl LineKind {
    pub fn is_terminal(self) -> bool {
        !matches!(self, LineKind::Informational)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    pub raw: String,
    pub kind: LineKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    StreamLine {
        run_id: RunId,
        line: ClassifiedLine,
    },
    /// The progress stream could not be opened or dropped before a terminal line.
    StreamFailed {
        run_id: RunId,
        error: StreamError,
    },
    SubmitCompleted {
        run_id: RunId,
        result: Result<Accepted, SubmitError>,
    },
    RetrieveCompleted {
        filename: String,
        result: Result<PathBuf, RetrieveError>,
    },
    /// The engine thread could not start; no further events will arrive.
    EngineFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct SubmitError {
    pub kind: SubmitFailureKind,
    pub message: String,
}

impl SubmitError {
    pub(crate) fn new(kind: SubmitFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitFailureKind {
    InvalidUrl,
    /// Server answered with a status other than `success`.
    Rejected,
    MalformedResponse,
    Timeout,
    Network,
}

impl fmt::Display for SubmitFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitFailureKind::InvalidUrl => write!(f, "invalid url"),
            SubmitFailureKind::Rejected => write!(f, "rejected by server"),
            SubmitFailureKind::MalformedResponse => write!(f, "malformed response"),
            SubmitFailureKind::Timeout => write!(f, "timeout"),
            SubmitFailureKind::Network => write!(f, "network error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct StreamError {
    pub kind: StreamFailureKind,
    pub message: String,
}

impl StreamError {
    pub(crate) fn new(kind: StreamFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Connect,
    /// Transport error while reading an open stream.
    Disconnected,
    /// Server closed the stream before sending a terminal line.
    Closed,
}

impl fmt::Display for StreamFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamFailureKind::InvalidUrl => write!(f, "invalid url"),
            StreamFailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            StreamFailureKind::Connect => write!(f, "connection failed"),
            StreamFailureKind::Disconnected => write!(f, "disconnected"),
            StreamFailureKind::Closed => write!(f, "closed by server"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RetrieveError {
    pub kind: RetrieveFailureKind,
    pub message: String,
}

impl RetrieveError {
    pub(crate) fn new(kind: RetrieveFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrieveFailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Persist,
}

impl fmt::Display for RetrieveFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrieveFailureKind::InvalidUrl => write!(f, "invalid url"),
            RetrieveFailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            RetrieveFailureKind::Timeout => write!(f, "timeout"),
            RetrieveFailureKind::Network => write!(f, "network error"),
            RetrieveFailureKind::Persist => write!(f, "could not save result"),
        }
    }
}
