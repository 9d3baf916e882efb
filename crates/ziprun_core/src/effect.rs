use crate::{CandidateFile, RunId};

/// Side effects requested by [`crate::update`]; executed by the platform layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open the progress stream for a run. Any other live stream must be closed first.
    OpenStream { run_id: RunId },
    /// Close the progress stream of a run if it is still open.
    CloseStream { run_id: RunId },
    /// Upload the candidate file for a run.
    Submit { run_id: RunId, file: CandidateFile },
    /// Fetch the named result artifact.
    Retrieve { filename: String },
}
