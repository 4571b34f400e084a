/// Truncate string to at most `max_chars` characters, respecting char boundaries.
/// An ellipsis marks strings that were cut.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }

    let cut: String = s.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}
