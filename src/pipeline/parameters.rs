use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Rendered in place of an empty parameter list ("see details").
pub const NO_PARAMETERS_SENTINEL: &str = "见详情";

// Longer units first: the regex engine takes the first alternative that fits.
static PARAMETER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"±?\d+(?:\.\d+)?(?:%|°|mm²|mm|kg|MPa|min|s|h)").unwrap()
});

/// Distinct technical-value tokens of one clause, kept sorted so the
/// rendered form is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSet(BTreeSet<String>);

impl ParameterSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Tokens joined with ", ", or [`NO_PARAMETERS_SENTINEL`] when empty.
    pub fn render(&self) -> String {
        if self.0.is_empty() {
            NO_PARAMETERS_SENTINEL.to_string()
        } else {
            self.iter().collect::<Vec<_>>().join(", ")
        }
    }
}

impl std::fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

impl FromIterator<String> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Every `[±]number+unit` token in `body`.
///
/// A unit directly followed by an ASCII letter belongs to a longer word
/// (`5seconds`, `3hours`, `10kgf`) and is not a token.
pub fn extract_parameters(body: &str) -> ParameterSet {
    PARAMETER_PATTERN
        .find_iter(body)
        .filter(|m| {
            !body[m.end()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic())
        })
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(body: &str) -> Vec<String> {
        extract_parameters(body).iter().map(str::to_string).collect()
    }

    #[test]
    fn tolerance_token_is_extracted_exactly() {
        let params = extract_parameters("提起试验样品至预定高度，高度误差不得超过 ±2%");
        assert_eq!(params.len(), 1);
        assert!(params.contains("±2%"));
    }

    #[test]
    fn all_units_are_recognized() {
        let body = "夹角 5°，面积 100mm²，长度 2.5mm，质量 10kg，强度 0.8MPa，\
                    保持 30min，间隔 5s，预处理 24h，湿度 50%";
        assert_eq!(
            tokens(body),
            vec!["0.8MPa", "100mm²", "10kg", "2.5mm", "24h", "30min", "50%", "5s", "5°"]
        );
    }

    #[test]
    fn duplicates_count_once() {
        let params = extract_parameters("误差 ±2%，重复试验误差仍为 ±2%");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn output_is_sorted_and_stable() {
        let a = extract_parameters("10kg 然后 5° 然后 ±2%").render();
        let b = extract_parameters("±2% 然后 10kg 然后 5°").render();
        assert_eq!(a, b);
        assert_eq!(a, "10kg, 5°, ±2%");
    }

    #[test]
    fn unit_followed_by_letters_is_rejected() {
        assert!(extract_parameters("wait 5seconds then 3hours").is_empty());
        assert!(extract_parameters("拉力 10kgf").is_empty());
    }

    #[test]
    fn unit_followed_by_punctuation_or_cjk_is_accepted() {
        assert_eq!(tokens("5mm。"), vec!["5mm"]);
        assert_eq!(tokens("5mm的"), vec!["5mm"]);
        assert_eq!(tokens("(5mm)"), vec!["5mm"]);
    }

    #[test]
    fn bare_numbers_are_not_parameters() {
        assert!(extract_parameters("见第 4.1 条和表 2").is_empty());
    }

    #[test]
    fn minutes_are_not_split_into_other_units() {
        assert_eq!(tokens("静置 15min"), vec!["15min"]);
    }

    #[test]
    fn empty_set_renders_sentinel() {
        let params = extract_parameters("试验报告应包括下列内容");
        assert!(params.is_empty());
        assert_eq!(params.render(), NO_PARAMETERS_SENTINEL);
        assert_eq!(params.to_string(), "见详情");
    }
}
