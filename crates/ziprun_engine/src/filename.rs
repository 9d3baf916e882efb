/// Fallback when the server-supplied name sanitizes to nothing.
const FALLBACK_NAME: &str = "result.zip";

const MAX_NAME_CHARS: usize = 120;

/// Local, Windows-safe file name for a server-supplied result name.
///
/// Only the last path component is kept, so a result can never be written
/// outside the output directory.
pub fn local_result_filename(server_name: &str) -> String {
    let last = server_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(server_name);

    let mut cleaned = String::with_capacity(last.len());
    let mut prev_underscore = false;
    for c in last.chars() {
        let c = if is_forbidden(c) { '_' } else { c };
        // Collapse runs of replaced characters.
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        cleaned.push(c);
    }

    let trimmed = cleaned.trim_matches(&['_', ' ', '.'][..]);
    if trimmed.is_empty() {
        return FALLBACK_NAME.to_string();
    }
    let mut name: String = trimmed.chars().take(MAX_NAME_CHARS).collect();
    if is_reserved_windows_name(&name) {
        name.insert(0, '_');
    }
    name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    let stem = name.split('.').next().unwrap_or(name);
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(stem))
}
