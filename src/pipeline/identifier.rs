//! Standard designation lookup.
//!
//! Designations such as `GB/T 4857.5-92`, `T/CAS 115-2005` or
//! `ISO 9001-2015` sit on the cover page, so only the head of the text is
//! searched. Documents without one are named after their file.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Used when neither the text nor the file name yields anything.
pub const FALLBACK_IDENTIFIER: &str = "document";

// No `\b` anchors: CJK characters count as word characters, so a
// designation glued to Chinese text would never match.
static DESIGNATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // Group standards: T/CAS 115-2005
        Regex::new(r"T/[A-Z]{2,}\s?\d+-\d{4}").unwrap(),
        // Slash-qualified national standards: GB/T 4857.5-92
        Regex::new(r"[A-Z]+/[A-Z]+\s?\d+(?:\.\d+)*-\d{2,4}").unwrap(),
        // Bare prefixes: GB 2626-2019, ISO 9001-2015
        Regex::new(r"[A-Z]{2,}\s?\d+(?:\.\d+)*-\d{2,4}").unwrap(),
    ]
});

static KEYWORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:标准号|标准编号)[:：]\s*([A-Za-z0-9./-]{5,})").unwrap()
});

/// Where an identifier came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierSource {
    /// A designation pattern matched the text.
    Designation,
    /// Text following a 标准号 / 标准编号 label.
    Keyword,
    /// File name stem.
    Filename,
}

impl IdentifierSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Designation => "designation",
            Self::Keyword => "keyword",
            Self::Filename => "filename",
        }
    }
}

/// Non-empty document identifier, stamped on every clause record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardIdentifier {
    pub value: String,
    pub source: IdentifierSource,
}

impl std::fmt::Display for StandardIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// Resolve the standard identifier from the first `prefix_chars` characters
/// of `text`, falling back to the stem of `file_name`. Never fails.
///
/// Designation patterns are tried in order (group, slash-qualified, bare)
/// and the first pattern that matches anywhere in the prefix wins.
pub fn resolve_standard_id(text: &str, file_name: &str, prefix_chars: usize) -> StandardIdentifier {
    let head = char_prefix(text, prefix_chars);

    if let Some(value) = DESIGNATION_PATTERNS
        .iter()
        .find_map(|re| re.find(head))
        .map(|m| strip_whitespace(m.as_str()))
    {
        return StandardIdentifier {
            value,
            source: IdentifierSource::Designation,
        };
    }

    if let Some(value) = KEYWORD_PATTERN
        .captures(head)
        .and_then(|caps| caps.get(1))
        .map(|m| strip_whitespace(m.as_str()))
    {
        return StandardIdentifier {
            value,
            source: IdentifierSource::Keyword,
        };
    }

    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .unwrap_or_default();

    tracing::debug!(file = file_name, "No designation in text, using file name");

    StandardIdentifier {
        value: if stem.is_empty() {
            FALLBACK_IDENTIFIER.to_string()
        } else {
            stem
        },
        source: IdentifierSource::Filename,
    }
}

/// First `n` characters of `text` (not bytes; never splits a code point).
fn char_prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_IDENTIFIER_PREFIX_CHARS;

    fn resolve(text: &str, file_name: &str) -> StandardIdentifier {
        resolve_standard_id(text, file_name, DEFAULT_IDENTIFIER_PREFIX_CHARS)
    }

    #[test]
    fn slash_qualified_designation_with_dotted_number() {
        let id = resolve("中华人民共和国国家标准\nGB/T 4857.5-92\n包装 运输包装件 跌落试验方法", "x.pdf");
        assert_eq!(id.value, "GB/T4857.5-92");
        assert_eq!(id.source, IdentifierSource::Designation);
    }

    #[test]
    fn bare_designation() {
        assert_eq!(resolve("ISO 9001-2015 Quality management", "x.pdf").value, "ISO9001-2015");
        assert_eq!(resolve("GB 2626-2019 呼吸防护", "x.pdf").value, "GB2626-2019");
    }

    #[test]
    fn group_standard_wins_over_later_patterns() {
        // The slash pattern alone would also accept this designation.
        let text = "团体标准 T/CAS 115-2005 参考 GB/T 4857.5-92";
        assert_eq!(resolve(text, "x.pdf").value, "T/CAS115-2005");
    }

    #[test]
    fn slash_pattern_tried_before_bare_pattern() {
        let text = "代替 GB 1234-88\n本标准 GB/T 4857.5-92";
        assert_eq!(resolve(text, "x.pdf").value, "GB/T4857.5-92");
    }

    #[test]
    fn designation_glued_to_chinese_text() {
        assert_eq!(resolve("本标准GB/T 4857.5-92规定了", "x.pdf").value, "GB/T4857.5-92");
    }

    #[test]
    fn keyword_anchor_fallback() {
        let id = resolve("企业标准\n标准编号：Q/ABC-001.2", "x.pdf");
        assert_eq!(id.value, "Q/ABC-001.2");
        assert_eq!(id.source, IdentifierSource::Keyword);

        assert_eq!(resolve("标准号: abc12345", "x.pdf").value, "abc12345");
    }

    #[test]
    fn keyword_needs_five_characters() {
        let id = resolve("标准号：A1", "fallback.docx");
        assert_eq!(id.value, "fallback");
        assert_eq!(id.source, IdentifierSource::Filename);
    }

    #[test]
    fn filename_stem_fallback() {
        let id = resolve("no designation here", "mystandard.pdf");
        assert_eq!(id.value, "mystandard");
        assert_eq!(id.source, IdentifierSource::Filename);
    }

    #[test]
    fn empty_text_and_empty_stem_give_document() {
        assert_eq!(resolve("", "").value, FALLBACK_IDENTIFIER);
    }

    #[test]
    fn designation_beyond_prefix_is_ignored() {
        let text = format!("{}GB/T 4857.5-92", "前".repeat(DEFAULT_IDENTIFIER_PREFIX_CHARS));
        let id = resolve(&text, "cover.pdf");
        assert_eq!(id.value, "cover");
    }

    #[test]
    fn prefix_counts_characters_not_bytes() {
        // 10 three-byte characters then the designation: inside a 30-char prefix
        let text = format!("{}GB 2626-2019", "标".repeat(10));
        assert_eq!(resolve_standard_id(&text, "x.pdf", 30).value, "GB2626-2019");
        assert_eq!(resolve_standard_id(&text, "x.pdf", 10).value, "x");
    }

    #[test]
    fn char_prefix_never_splits_code_points() {
        assert_eq!(char_prefix("跌落试验", 2), "跌落");
        assert_eq!(char_prefix("abc", 10), "abc");
        assert_eq!(char_prefix("abc", 0), "");
    }

    #[test]
    fn display_is_the_value() {
        let id = resolve("GB 2626-2019", "x.pdf");
        assert_eq!(id.to_string(), "GB2626-2019");
        assert_eq!(id.source.as_str(), "designation");
    }
}
