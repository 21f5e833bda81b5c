//! Utility functions

/// Lower-cases and trims an email address for lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Masks the local part of an email address for log output.
pub fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        let visible: String = local.chars().take(2).collect();
        if visible.is_empty() {
            format!("***{}", domain)
        } else {
            format!("{}***{}", visible, domain)
        }
    } else {
        "***".to_string()
    }
}

/// Splits newline-delimited text into trimmed, non-empty lines.
pub fn non_blank_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Treats empty or whitespace-only strings as absent.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
