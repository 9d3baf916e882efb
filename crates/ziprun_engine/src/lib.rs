//! Ziprun engine: HTTP submission, progress stream and result retrieval.
mod engine;
mod filename;
mod persist;
mod progress;
mod retrieve;
mod settings;
mod sse;
mod submit;
mod types;

pub use engine::{EngineHandle, EngineServices};
pub use filename::local_result_filename;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use progress::{open_progress, LogSource, Markers, ProgressStream, RawLogStream, SseLogSource};
pub use retrieve::{ReqwestRetriever, Retriever};
pub use settings::EngineSettings;
pub use sse::SseDecoder;
pub use submit::{ReqwestSubmitter, Submitter};
pub use types::{
    Accepted, CandidateUpload, ClassifiedLine, EngineEvent, LineKind, RetrieveError,
    RetrieveFailureKind, RunId, StreamError, StreamFailureKind, SubmitError, SubmitFailureKind,
};
