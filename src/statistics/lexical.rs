//! Lexical diversity measures.
//!
//! Per-record type-token ratio and corpus-wide (global) type-token ratio
//! answer different questions and routinely disagree: a corpus of varied
//! captions that all share a template has high per-record TTR and low global
//! TTR. Both are always reported, under distinct names.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::record::{CaptionLevel, Record};
use crate::text::TextFeatureExtractor;

/// Number of most frequent words reported.
pub const TOP_WORDS: usize = 20;

/// Summary of a sequence of numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let sum: f64 = values.iter().sum();
        Self {
            mean: sum / values.len() as f64,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

/// Vocabulary richness of the caption corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LexicalDiversity {
    /// Records with a non-empty caption.
    pub captions: usize,
    /// Mean, min and max of the per-record type-token ratio.
    pub record_ttr: Summary,
    /// Unique types over total tokens across the whole corpus.
    pub global_ttr: f64,
    pub total_tokens: usize,
    pub unique_types: usize,
    pub words_per_caption: Summary,
    pub top_words: Vec<WordCount>,
}

/// Type-token ratio of one level of the hierarchical caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentDiversity {
    pub level: CaptionLevel,
    /// Records whose caption has text at this level.
    pub captions: usize,
    pub mean_record_ttr: f64,
    pub global_ttr: f64,
    pub total_tokens: usize,
}

/// Unique over total; 0 for no tokens.
pub fn type_token_ratio<S: AsRef<str> + Eq + std::hash::Hash>(tokens: &[S]) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    let unique: HashSet<&str> = tokens.iter().map(|t| t.as_ref()).collect();
    unique.len() as f64 / tokens.len() as f64
}

struct TtrAccumulator {
    ttrs: Vec<f64>,
    word_counts: Vec<f64>,
    frequencies: HashMap<String, usize>,
    total_tokens: usize,
}

impl TtrAccumulator {
    fn new() -> Self {
        Self {
            ttrs: Vec::new(),
            word_counts: Vec::new(),
            frequencies: HashMap::new(),
            total_tokens: 0,
        }
    }

    fn add(&mut self, tokens: Vec<String>) {
        self.ttrs.push(type_token_ratio(&tokens));
        self.word_counts.push(tokens.len() as f64);
        self.total_tokens += tokens.len();
        for token in tokens {
            *self.frequencies.entry(token).or_insert(0) += 1;
        }
    }

    fn global_ttr(&self) -> f64 {
        if self.total_tokens == 0 {
            0.0
        } else {
            self.frequencies.len() as f64 / self.total_tokens as f64
        }
    }
}

impl LexicalDiversity {
    pub fn compute(records: &[Record], extractor: &TextFeatureExtractor) -> Self {
        let mut acc = TtrAccumulator::new();
        for record in records {
            let caption = record.caption_text();
            if caption.is_empty() {
                continue;
            }
            acc.add(extractor.word_tokens(&caption));
        }

        let mut top_words: Vec<WordCount> = acc
            .frequencies
            .iter()
            .map(|(word, &count)| WordCount {
                word: word.clone(),
                count,
            })
            .collect();
        top_words.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
        top_words.truncate(TOP_WORDS);

        Self {
            captions: acc.ttrs.len(),
            record_ttr: Summary::of(&acc.ttrs),
            global_ttr: acc.global_ttr(),
            total_tokens: acc.total_tokens,
            unique_types: acc.frequencies.len(),
            words_per_caption: Summary::of(&acc.word_counts),
            top_words,
        }
    }
}

impl SegmentDiversity {
    /// Diversity of every caption level. Flat captions contribute nothing.
    pub fn compute_all(records: &[Record], extractor: &TextFeatureExtractor) -> Vec<Self> {
        CaptionLevel::all()
            .into_iter()
            .map(|level| Self::compute(records, extractor, level))
            .collect()
    }

    pub fn compute(records: &[Record], extractor: &TextFeatureExtractor, level: CaptionLevel) -> Self {
        let mut acc = TtrAccumulator::new();
        for record in records {
            let text = record.caption.level_text(level);
            if text.is_empty() {
                continue;
            }
            acc.add(extractor.word_tokens(&text));
        }

        Self {
            level,
            captions: acc.ttrs.len(),
            mean_record_ttr: Summary::of(&acc.ttrs).mean,
            global_ttr: acc.global_ttr(),
            total_tokens: acc.total_tokens,
        }
    }
}
