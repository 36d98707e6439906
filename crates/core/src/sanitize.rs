use crate::metadata::UNKNOWN_MAKE;

const WINDOWS_RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Turns a camera make into a single safe folder name.
pub fn sanitize_make(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if is_disallowed_char(ch) {
            out.push('_');
        } else {
            out.push(ch);
        }
    }

    let mut out = out.trim_end_matches([' ', '.']).trim().to_string();

    if out.is_empty() || out.chars().all(|c| c == '.') {
        return UNKNOWN_MAKE.to_string();
    }

    if is_windows_reserved(&out) {
        out.push_str("_make");
    }

    out
}

fn is_disallowed_char(ch: char) -> bool {
    matches!(ch, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
        || ch == '\0'
        || ch.is_control()
}

fn is_windows_reserved(value: &str) -> bool {
    let stem = value
        .split('.')
        .next()
        .unwrap_or(value)
        .to_ascii_uppercase();
    WINDOWS_RESERVED_NAMES
        .iter()
        .any(|reserved| reserved == &stem)
}
