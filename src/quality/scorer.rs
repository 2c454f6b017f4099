//! Per-record annotation quality scoring.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::issues::{CaptionInspector, CaptionIssue};
use crate::record::{CaptionEntry, CaptionLevel, Record};

/// Default minimum total tokens for a passing record.
pub const DEFAULT_MIN_TOTAL_TOKENS: u32 = 50;

/// Default minimum number of application areas for a passing record.
pub const DEFAULT_MIN_APPLICATION_AREAS: usize = 5;

/// Token counts per caption level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentTokens {
    pub object: u32,
    pub semantic: u32,
    pub application: u32,
}

impl SegmentTokens {
    pub fn get(&self, level: CaptionLevel) -> u32 {
        match level {
            CaptionLevel::Object => self.object,
            CaptionLevel::Semantic => self.semantic,
            CaptionLevel::Application => self.application,
        }
    }

    pub fn sum(&self) -> u32 {
        self.object + self.semantic + self.application
    }
}

/// Quality verdict for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub id: String,
    pub segment_tokens: SegmentTokens,
    pub total_tokens: u32,
    pub has_structured_reasoning: bool,
    pub application_areas: usize,
    pub pass: bool,
    /// Token-based score in [0, 100].
    pub token_score: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<CaptionIssue>,
}

/// Scores records against token and application-area thresholds.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    min_total_tokens: u32,
    min_application_areas: usize,
    inspector: CaptionInspector,
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_TOTAL_TOKENS, DEFAULT_MIN_APPLICATION_AREAS)
    }
}

impl QualityScorer {
    pub fn new(min_total_tokens: u32, min_application_areas: usize) -> Self {
        Self {
            min_total_tokens,
            min_application_areas,
            inspector: CaptionInspector::default(),
        }
    }

    pub fn with_inspector(mut self, inspector: CaptionInspector) -> Self {
        self.inspector = inspector;
        self
    }

    pub fn score(&self, record: &Record) -> QualityReport {
        let caption = &record.caption;

        let segment_tokens = SegmentTokens {
            object: entry_tokens(&caption.object),
            semantic: entry_tokens(&caption.semantic),
            application: entry_tokens(&caption.application),
        };
        let total_tokens = if caption.is_segmented() {
            segment_tokens.sum()
        } else {
            whitespace_tokens(&caption.text)
        };

        let has_structured_reasoning = CaptionLevel::all()
            .iter()
            .any(|level| caption.entries(*level).iter().any(|e| !e.text.trim().is_empty()));

        let application_areas = count_application_areas(&caption.application);
        let pass = total_tokens >= self.min_total_tokens
            && application_areas >= self.min_application_areas;

        QualityReport {
            id: record.id.clone(),
            segment_tokens,
            total_tokens,
            has_structured_reasoning,
            application_areas,
            pass,
            token_score: token_score(total_tokens),
            issues: self.inspector.inspect(caption),
        }
    }
}

fn whitespace_tokens(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

fn entry_tokens(entries: &[CaptionEntry]) -> u32 {
    entries
        .iter()
        .map(|e| e.token_count.unwrap_or_else(|| whitespace_tokens(&e.text)))
        .sum()
}

/// Piecewise token score: full marks from 100 tokens, 75 at the 50 token
/// threshold, linear below.
pub fn token_score(total_tokens: u32) -> f64 {
    let t = total_tokens as f64;
    if total_tokens >= 100 {
        100.0
    } else if total_tokens >= 50 {
        75.0 + (t - 50.0) / 50.0 * 25.0
    } else if total_tokens > 0 {
        t / 50.0 * 75.0
    } else {
        0.0
    }
}

/// Distinct numbered markers (`1)`, `2.`) across the application entries,
/// else the number of non-empty entries.
pub fn count_application_areas(entries: &[CaptionEntry]) -> usize {
    let mut markers = BTreeSet::new();
    for entry in entries {
        markers.extend(numbered_markers(&entry.text));
    }
    if !markers.is_empty() {
        return markers.len();
    }
    entries.iter().filter(|e| !e.text.trim().is_empty()).count()
}

/// Numbers written as list markers: digits at a word start, followed by `)`
/// or `.` and then whitespace or the end of the text.
fn numbered_markers(text: &str) -> Vec<u32> {
    let chars: Vec<char> = text.chars().collect();
    let mut found = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let at_word_start = i == 0 || chars[i - 1].is_whitespace() || chars[i - 1] == '(';
        if !(at_word_start && chars[i].is_ascii_digit()) {
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        let closes = i < chars.len() && (chars[i] == ')' || chars[i] == '.');
        let then_space = i + 1 >= chars.len() || chars[i + 1].is_whitespace();
        if closes && then_space {
            let digits: String = chars[start..i].iter().collect();
            if let Ok(n) = digits.parse() {
                found.push(n);
            }
        }
    }
    found
}
