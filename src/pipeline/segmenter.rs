//! Clause segmentation.
//!
//! Two rules, tried in order:
//!
//! 1. **Numbered**: a line opening with a dotted section number of one to
//!    three levels (`4`, `4.1`, `5.6.1`) followed by blank space and text
//!    starts a clause that runs until the next such line.
//! 2. **Paragraph**: when too few numbered headings are found, each long line
//!    (optionally only those using compliance vocabulary) becomes a clause
//!    labelled `paragraph-<n>`.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::extraction::normalize_whitespace;
use super::parameters::ParameterSet;

// Any horizontal space separates number and title; CJK typesetting often
// uses U+3000 or NBSP there.
static HEADING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3}(?:\.\d{1,3}){0,2})[\p{Zs}\t]+(\S.*)$").unwrap()
});

/// Words marking a normative sentence: shall, not, required, must, tolerance.
const COMPLIANCE_TERMS: &[&str] = &["应", "不", "要求", "必须", "误差"];

/// Which lines the paragraph rule keeps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphFilter {
    /// Only lines containing a compliance term.
    #[default]
    Compliance,
    /// Every line long enough.
    Any,
}

/// What happens when a section number repeats within one document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The later clause wins and keeps its later position. A table of
    /// contents entry is superseded by the body section it names.
    #[default]
    KeepLast,
    KeepFirst,
    KeepAll,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Fewer numbered headings than this consults the paragraph rule.
    pub min_numbered_clauses: usize,
    /// Paragraph-rule lines must be strictly longer than this, in chars.
    pub min_paragraph_chars: usize,
    pub paragraph_filter: ParagraphFilter,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_numbered_clauses: 3,
            min_paragraph_chars: 20,
            paragraph_filter: ParagraphFilter::default(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

/// Which rule produced a clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStrategy {
    Numbered,
    Paragraph,
}

impl SegmentStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numbered => "numbered",
            Self::Paragraph => "paragraph",
        }
    }
}

/// One addressable unit of a standard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub standard_id: String,
    pub clause_id: String,
    pub body: String,
    /// Empty until the parameter stage runs.
    pub parameters: ParameterSet,
    pub source_file: String,
    pub strategy: SegmentStrategy,
}

/// Segmenter output for one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    pub strategy: SegmentStrategy,
    /// Numbered heading lines seen, before duplicate handling.
    pub heading_matches: usize,
    pub clauses: Vec<Clause>,
}

/// Split `text` into clauses. Never fails; empty text gives no clauses.
pub fn segment(
    text: &str,
    standard_id: &str,
    source_file: &str,
    config: &SegmenterConfig,
) -> Segmentation {
    let sections = numbered_sections(text);
    let heading_matches = sections.len();

    let make = |clause_id: String, body: String, strategy: SegmentStrategy| Clause {
        standard_id: standard_id.to_string(),
        clause_id,
        body,
        parameters: ParameterSet::default(),
        source_file: source_file.to_string(),
        strategy,
    };

    let numbered: Vec<Clause> = sections
        .into_iter()
        .map(|(id, body)| make(id, body, SegmentStrategy::Numbered))
        .collect();

    if heading_matches >= config.min_numbered_clauses {
        return Segmentation {
            strategy: SegmentStrategy::Numbered,
            heading_matches,
            clauses: apply_duplicate_policy(numbered, config.duplicate_policy),
        };
    }

    let paragraphs: Vec<Clause> = paragraph_lines(text, config)
        .into_iter()
        .enumerate()
        .map(|(i, body)| make(format!("paragraph-{}", i + 1), body, SegmentStrategy::Paragraph))
        .collect();

    // A weak numbered result still beats a paragraph split that finds no more.
    if heading_matches > 0 && paragraphs.len() <= numbered.len() {
        tracing::debug!(
            headings = heading_matches,
            paragraphs = paragraphs.len(),
            "Few numbered headings, keeping them over paragraph split"
        );
        return Segmentation {
            strategy: SegmentStrategy::Numbered,
            heading_matches,
            clauses: apply_duplicate_policy(numbered, config.duplicate_policy),
        };
    }

    if !text.trim().is_empty() {
        tracing::warn!(
            file = source_file,
            headings = heading_matches,
            paragraphs = paragraphs.len(),
            "No reliable section numbering, falling back to paragraph split"
        );
    }

    Segmentation {
        strategy: SegmentStrategy::Paragraph,
        heading_matches,
        clauses: paragraphs,
    }
}

/// `(section number, normalized body)` for every heading line, in order.
/// Lines before the first heading belong to no section.
fn numbered_sections(text: &str) -> Vec<(String, String)> {
    let mut sections: Vec<(String, Vec<&str>)> = Vec::new();

    for line in text.lines() {
        let line = line.trim_start();
        match HEADING_PATTERN.captures(line) {
            Some(caps) => {
                let number = caps.get(1).map_or("", |m| m.as_str());
                let first = caps.get(2).map_or("", |m| m.as_str());
                sections.push((number.to_string(), vec![first]));
            }
            None => {
                if let Some((_, body)) = sections.last_mut() {
                    body.push(line);
                }
            }
        }
    }

    sections
        .into_iter()
        .map(|(number, lines)| (number, normalize_whitespace(&lines.join("\n"))))
        .collect()
}

fn paragraph_lines(text: &str, config: &SegmenterConfig) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.chars().count() > config.min_paragraph_chars)
        .filter(|line| match config.paragraph_filter {
            ParagraphFilter::Compliance => COMPLIANCE_TERMS.iter().any(|t| line.contains(t)),
            ParagraphFilter::Any => true,
        })
        .map(normalize_whitespace)
        .collect()
}

fn apply_duplicate_policy(clauses: Vec<Clause>, policy: DuplicatePolicy) -> Vec<Clause> {
    match policy {
        DuplicatePolicy::KeepAll => clauses,
        DuplicatePolicy::KeepFirst => {
            let mut seen = HashSet::new();
            clauses
                .into_iter()
                .filter(|c| seen.insert(c.clause_id.clone()))
                .collect()
        }
        DuplicatePolicy::KeepLast => {
            let mut seen = HashSet::new();
            let mut kept: Vec<Clause> = clauses
                .into_iter()
                .rev()
                .filter(|c| seen.insert(c.clause_id.clone()))
                .collect();
            kept.reverse();
            kept
        }
    }
}
