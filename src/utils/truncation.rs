/// Truncate long text around the middle, keeping head and tail. DOM dumps
/// carry their signal at both ends (head metadata, tail scripts).
pub fn truncate_middle(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let half = max_chars / 2;
    let chars: Vec<char> = text.chars().collect();
    let start: String = chars[..half].iter().collect();
    let end: String = chars[chars.len() - half..].iter().collect();
    format!(
        "{}\n\n... [truncated {} chars] ...\n\n{}",
        start,
        chars.len() - max_chars,
        end
    )
}

/// Truncate an error or summary string at the end.
pub fn truncate_end(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
