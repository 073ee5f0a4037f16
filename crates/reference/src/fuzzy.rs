//! Fuzzy resolution of compliance rules against compliance-sheet columns.

use crate::csv::Sheet;
use serde::{Deserialize, Serialize};

/// Rules every piece of content must be checked against.
pub const MANDATORY_RULES: [&str; 2] = ["disclaimer", "data_protection"];

/// Value used when no column resolves a rule.
pub const RULE_PLACEHOLDER: &str = "Default placeholder - consult legal team";

/// Minimum partial-ratio score for a column header to match a rule name.
pub const MATCH_THRESHOLD: u8 = 75;

/// Similarity of the shorter string to its best-matching same-length window
/// of the longer one, on a 0–100 scale.
///
/// Each window scores `round(200 * lcs / (len_a + len_b))` where `lcs` is
/// the longest common subsequence. Either string empty scores 0.
///
/// This approximates fuzzywuzzy's `partial_ratio`, which scores windows
/// with difflib matching blocks instead of an LCS. The two can differ by a
/// few points on loosely related strings (`data_protection` against
/// `declaration` is 55 here and 67 there) but agree on which compliance
/// headers clear [`MATCH_THRESHOLD`].
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    let width = shorter.len();
    let total = 2 * width;

    let mut best = 0;
    for window in longer.windows(width) {
        let lcs = lcs_len(shorter, window);
        let score = (200 * lcs + total / 2) / total;
        best = best.max(score);
        if best == 100 {
            break;
        }
    }
    best as u8
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Rule name → resolved value. Every requested rule is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceRuleResolution {
    rules: Vec<(String, String)>,
}

impl ComplianceRuleResolution {
    /// Resolve each rule to the first-row value of the first column whose
    /// lowercased header scores at least [`MATCH_THRESHOLD`] against it.
    ///
    /// Columns are scanned in order and the first qualifying one wins, even
    /// if a later column would score higher.
    pub fn resolve(sheet: &Sheet, rules: &[&str]) -> Self {
        let rules = rules
            .iter()
            .map(|rule| {
                let value = sheet
                    .header
                    .iter()
                    .position(|column| {
                        partial_ratio(rule, &column.trim().to_lowercase()) >= MATCH_THRESHOLD
                    })
                    .and_then(|index| sheet.first_value(index))
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .unwrap_or(RULE_PLACEHOLDER);
                (rule.to_string(), value.to_string())
            })
            .collect();
        Self { rules }
    }

    /// Every rule mapped to the placeholder.
    pub fn unresolved(rules: &[&str]) -> Self {
        Self {
            rules: rules
                .iter()
                .map(|r| (r.to_string(), RULE_PLACEHOLDER.to_string()))
                .collect(),
        }
    }

    pub fn get(&self, rule: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|(r, _)| r == rule)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|(r, v)| (r.as_str(), v.as_str()))
    }

    /// Rules that fell back to the placeholder.
    pub fn unresolved_rules(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, v)| *v == RULE_PLACEHOLDER)
            .map(|(r, _)| r)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(header: &[&str], first_row: &[&str]) -> Sheet {
        Sheet {
            header: header.iter().map(|s| s.to_string()).collect(),
            rows: vec![first_row.iter().map(|s| s.to_string()).collect()],
        }
    }

    #[test]
    fn loosely_related_headers_stay_below_threshold() {
        assert!(partial_ratio("data_protection", "declaration") < MATCH_THRESHOLD);
        assert!(partial_ratio("disclaimer", "description") < MATCH_THRESHOLD);
        assert!(partial_ratio("data_protection", "data protection notice") >= MATCH_THRESHOLD);
    }

    #[test]
    fn identical_and_contained_strings_score_100() {
        assert_eq!(partial_ratio("disclaimer", "disclaimer"), 100);
        assert_eq!(partial_ratio("disclaimer", "disclaimer_necessari"), 100);
        assert_eq!(partial_ratio("disclaimer_necessari", "disclaimer"), 100);
    }

    #[test]
    fn empty_input_scores_zero() {
        assert_eq!(partial_ratio("", "disclaimer"), 0);
        assert_eq!(partial_ratio("disclaimer", ""), 0);
    }

    #[test]
    fn near_miss_clears_threshold() {
        assert!(partial_ratio("disclaimer", "disclamer") >= MATCH_THRESHOLD);
        assert!(partial_ratio("data_protection", "privacy") < MATCH_THRESHOLD);
    }

    #[test]
    fn resolves_matching_columns_and_falls_back_otherwise() {
        let sheet = sheet(&["Disclaimer", "privacy"], &["Risk disclosure text", "GDPR"]);
        let resolution = ComplianceRuleResolution::resolve(&sheet, &MANDATORY_RULES);
        assert_eq!(resolution.get("disclaimer"), Some("Risk disclosure text"));
        assert_eq!(resolution.get("data_protection"), Some(RULE_PLACEHOLDER));
        assert_eq!(resolution.unresolved_rules(), vec!["data_protection"]);
    }

    #[test]
    fn first_qualifying_column_wins() {
        let sheet = sheet(
            &["disclaimers_extra", "disclaimer"],
            &["from first column", "from exact column"],
        );
        let resolution = ComplianceRuleResolution::resolve(&sheet, &["disclaimer"]);
        assert_eq!(resolution.get("disclaimer"), Some("from first column"));
    }

    #[test]
    fn matched_column_with_empty_cell_uses_placeholder() {
        let sheet = sheet(&["disclaimer", "data_protection"], &["", "GDPR notice"]);
        let resolution = ComplianceRuleResolution::resolve(&sheet, &MANDATORY_RULES);
        assert_eq!(resolution.get("disclaimer"), Some(RULE_PLACEHOLDER));
        assert_eq!(resolution.get("data_protection"), Some("GDPR notice"));
    }

    #[test]
    fn every_mandatory_rule_is_present() {
        let empty = Sheet::default();
        let resolution = ComplianceRuleResolution::resolve(&empty, &MANDATORY_RULES);
        for rule in MANDATORY_RULES {
            assert_eq!(resolution.get(rule), Some(RULE_PLACEHOLDER));
        }
        assert_eq!(ComplianceRuleResolution::unresolved(&MANDATORY_RULES), resolution);
    }
}
