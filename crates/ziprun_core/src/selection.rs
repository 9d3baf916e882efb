use std::sync::Arc;

use crate::CandidateFile;

/// Literal, case-sensitive suffix an accepted archive name must end with.
pub const ZIP_SUFFIX: &str = ".zip";

/// File-info text shown when a selection is not a ZIP archive.
pub const REJECTED_FILE_MESSAGE: &str = "Error: selected file is not a ZIP archive";

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Accepted {
        file: CandidateFile,
        descriptor: String,
    },
    Rejected {
        descriptor: String,
    },
}

impl Selection {
    pub fn descriptor(&self) -> &str {
        match self {
            Selection::Accepted { descriptor, .. } | Selection::Rejected { descriptor } => {
                descriptor
            }
        }
    }
}

/// Validate a user-chosen file by name suffix.
pub fn select_file(name: &str, size_bytes: u64, content: Arc<[u8]>) -> Selection {
    if !name.ends_with(ZIP_SUFFIX) {
        return Selection::Rejected {
            descriptor: REJECTED_FILE_MESSAGE.to_string(),
        };
    }
    let descriptor = format!("Selected file: {name} ({})", format_bytes(size_bytes));
    Selection::Accepted {
        file: CandidateFile {
            name: name.to_string(),
            size_bytes,
            content,
        },
        descriptor,
    }
}

/// Render a byte count on a 1024-based ladder, e.g. `1536` -> `"1.5 KB"`.
///
/// Picks the largest unit (up to GB) whose scaled value is at least 1 and rounds
/// to two decimals, dropping trailing zeros.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut unit = 0;
    while unit + 1 < UNITS.len() && bytes >= 1024u64.pow(unit as u32 + 1) {
        unit += 1;
    }
    let scaled = bytes as f64 / 1024f64.powi(unit as i32);
    let rounded = (scaled * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}
