use crate::RunState;

/// Everything a front end needs to render the client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub run_state: RunState,
    /// Descriptor of the last selection, accepted or rejected.
    pub file_info: Option<String>,
    pub log_lines: Vec<String>,
    /// Busy indicator; true while the progress stream of a run is open.
    pub busy: bool,
    pub start_enabled: bool,
    pub retrieval_enabled: bool,
    pub result_filename: Option<String>,
    pub dirty: bool,
}
