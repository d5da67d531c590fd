/// Cleans raw extractor output before segmentation.
///
/// Drops control characters (newline and tab survive), trims every line and
/// removes blank lines. Symbols such as "±", "°" and "²" are left untouched.
pub fn sanitize_extracted_text(raw: &str) -> String {
    raw.chars()
        // Form feeds separate pages in some text layers
        .map(|c| if matches!(c, '\x0b' | '\x0c') { '\n' } else { c })
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
        .collect::<String>()
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse every whitespace run (including newlines) to a single space and
/// trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
