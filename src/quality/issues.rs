//! Caption issue inspection.
//!
//! Issues are diagnostics for annotators. They are reported beside the
//! pass/fail verdict and never change it.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::record::Caption;

/// Issue severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The caption is unusable as written.
    Major,
    /// Probably a copy/paste or typing slip.
    Minor,
    /// Worth a look, may be legitimate.
    Warning,
}

/// Kinds of caption issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionIssueType {
    EmptyCaption,
    TooShort,
    TooLong,
    RepeatedWord,
    SuspiciousPattern,
    EmptyEntry,
}

impl std::fmt::Display for CaptionIssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CaptionIssueType::EmptyCaption => "EmptyCaption",
            CaptionIssueType::TooShort => "TooShort",
            CaptionIssueType::TooLong => "TooLong",
            CaptionIssueType::RepeatedWord => "RepeatedWord",
            CaptionIssueType::SuspiciousPattern => "SuspiciousPattern",
            CaptionIssueType::EmptyEntry => "EmptyEntry",
        };
        write!(f, "{}", name)
    }
}

/// A problem found in a caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionIssue {
    pub issue_type: CaptionIssueType,
    pub severity: Severity,
    pub description: String,
}

impl CaptionIssue {
    pub fn new(
        issue_type: CaptionIssueType,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            issue_type,
            severity,
            description: description.into(),
        }
    }
}

/// Checks captions for length, repetition and garbage patterns.
#[derive(Debug, Clone)]
pub struct CaptionInspector {
    min_chars: usize,
    max_chars: usize,
    /// Minimum run length of one repeated character to flag.
    max_char_run: usize,
    patterns: Vec<(&'static str, Regex)>,
}

impl Default for CaptionInspector {
    fn default() -> Self {
        Self::new(20, 2000)
    }
}

impl CaptionInspector {
    pub fn new(min_chars: usize, max_chars: usize) -> Self {
        let patterns = [
            ("jamo-only text", r"^[ㄱ-ㅎㅏ-ㅣ]+$"),
            ("long Latin-only text", r"^[a-zA-Z\s]{100,}$"),
        ]
        .into_iter()
        .filter_map(|(name, pattern)| Regex::new(pattern).ok().map(|re| (name, re)))
        .collect();

        Self {
            min_chars,
            max_chars,
            max_char_run: 11,
            patterns,
        }
    }

    pub fn inspect(&self, caption: &Caption) -> Vec<CaptionIssue> {
        let entries: Vec<&str> = if caption.is_segmented() {
            [&caption.object, &caption.semantic, &caption.application]
                .into_iter()
                .flatten()
                .map(|e| e.text.as_str())
                .collect()
        } else {
            vec![caption.text.as_str()]
        };

        let mut issues = Vec::new();
        let non_empty: Vec<&str> = entries.iter().copied().filter(|t| !t.is_empty()).collect();
        if non_empty.is_empty() {
            issues.push(CaptionIssue::new(
                CaptionIssueType::EmptyCaption,
                Severity::Major,
                "All caption entries are empty",
            ));
            return issues;
        }

        let combined = non_empty.join(" ");
        let len = combined.chars().count();
        if len < self.min_chars {
            issues.push(CaptionIssue::new(
                CaptionIssueType::TooShort,
                Severity::Major,
                format!("Caption is too short: {} chars", len),
            ));
        } else if len > self.max_chars {
            issues.push(CaptionIssue::new(
                CaptionIssueType::TooLong,
                Severity::Minor,
                format!("Caption is too long: {} chars", len),
            ));
        }

        for entry in &non_empty {
            if let Some((word, count)) = repeated_word(entry) {
                issues.push(CaptionIssue::new(
                    CaptionIssueType::RepeatedWord,
                    Severity::Minor,
                    format!("Word '{}' repeated {} times", word, count),
                ));
            }
        }

        for (name, re) in &self.patterns {
            if re.is_match(&combined) {
                issues.push(CaptionIssue::new(
                    CaptionIssueType::SuspiciousPattern,
                    Severity::Warning,
                    format!("Suspicious pattern: {}", name),
                ));
            }
        }
        if let Some((c, run)) = longest_char_run(&combined).filter(|(_, run)| *run >= self.max_char_run)
        {
            issues.push(CaptionIssue::new(
                CaptionIssueType::SuspiciousPattern,
                Severity::Warning,
                format!("Suspicious pattern: '{}' repeated {} times in a row", c, run),
            ));
        }

        let blank = non_empty.iter().filter(|t| t.trim().is_empty()).count();
        if blank > 0 {
            issues.push(CaptionIssue::new(
                CaptionIssueType::EmptyEntry,
                Severity::Warning,
                format!("{} blank caption entries", blank),
            ));
        }

        issues
    }
}

/// First word longer than 2 chars appearing more than 5 times in an entry of
/// more than 10 words.
fn repeated_word(entry: &str) -> Option<(String, usize)> {
    let words: Vec<&str> = entry.split_whitespace().collect();
    if words.len() <= 10 {
        return None;
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();
    for &w in &words {
        let count = counts.entry(w).or_insert(0);
        if *count == 0 {
            order.push(w);
        }
        *count += 1;
    }

    order
        .into_iter()
        .find(|w| counts[w] > 5 && w.chars().count() > 2)
        .map(|w| (w.to_string(), counts[w]))
}

/// Longest run of one non-whitespace character.
fn longest_char_run(text: &str) -> Option<(char, usize)> {
    let mut best: Option<(char, usize)> = None;
    let mut current: Option<(char, usize)> = None;

    for c in text.chars() {
        current = match current {
            Some((prev, n)) if prev == c && !c.is_whitespace() => Some((prev, n + 1)),
            _ if c.is_whitespace() => None,
            _ => Some((c, 1)),
        };
        if let Some((c, n)) = current {
            if best.map(|(_, b)| n > b).unwrap_or(true) {
                best = Some((c, n));
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CaptionEntry;

    fn types(issues: &[CaptionIssue]) -> Vec<CaptionIssueType> {
        issues.iter().map(|i| i.issue_type).collect()
    }

    #[test]
    fn test_clean_caption_has_no_issues() {
        let caption = Caption::flat("도심의 교차로를 지나는 버스와 보행자들이 보이는 장면입니다.");
        assert!(CaptionInspector::default().inspect(&caption).is_empty());
    }

    #[test]
    fn test_empty_caption() {
        let issues = CaptionInspector::default().inspect(&Caption::default());
        assert_eq!(types(&issues), vec![CaptionIssueType::EmptyCaption]);
        assert_eq!(issues[0].severity, Severity::Major);
    }

    #[test]
    fn test_short_and_long() {
        let inspector = CaptionInspector::default();
        let short = inspector.inspect(&Caption::flat("짧은 캡션"));
        assert_eq!(types(&short), vec![CaptionIssueType::TooShort]);

        let long = inspector.inspect(&Caption::flat("가나 ".repeat(700)));
        assert!(types(&long).contains(&CaptionIssueType::TooLong));
    }

    #[test]
    fn test_repeated_word_in_entry() {
        let text = "the market market market market market market is busy with many people";
        let caption = Caption::segmented(vec![CaptionEntry::new(text)], vec![], vec![]);
        let issues = CaptionInspector::default().inspect(&caption);
        assert!(issues
            .iter()
            .any(|i| i.issue_type == CaptionIssueType::RepeatedWord
                && i.description.contains("market")));
    }

    #[test]
    fn test_suspicious_patterns() {
        let inspector = CaptionInspector::default();

        let jamo = inspector.inspect(&Caption::flat("ㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋ"));
        let jamo_types = types(&jamo);
        assert_eq!(
            jamo_types
                .iter()
                .filter(|t| **t == CaptionIssueType::SuspiciousPattern)
                .count(),
            2
        );

        let latin = inspector.inspect(&Caption::flat("a plain english sentence ".repeat(5)));
        assert!(types(&latin).contains(&CaptionIssueType::SuspiciousPattern));
    }

    #[test]
    fn test_longest_char_run() {
        assert_eq!(longest_char_run("ab   cccd"), Some(('c', 3)));
        assert_eq!(longest_char_run("   "), None);
    }
}
