//! Ziprun core: pure upload/progress/retrieval state machine and view-model helpers.
mod effect;
mod msg;
mod selection;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::{Msg, StreamSignal, SubmissionError};
pub use selection::{
    format_bytes, select_file, Selection, REJECTED_FILE_MESSAGE, ZIP_SUFFIX,
};
pub use state::{
    AppState, CandidateFile, LogLine, ResultHandle, RunId, RunState, STREAM_DISCONNECTED_LINE,
};
pub use update::update;
pub use view_model::AppViewModel;
