//! Word-run scanning and the pluggable keyword tokenizers.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::tagger::{MorphTagger, PartOfSpeech};

/// Words that carry no content in captions.
const STOPWORDS: &[&str] = &[
    "있는", "있다", "되는", "되다", "하는", "하다", "이다", "그", "저", "것", "있습니다", "됩니다",
    "합니다", "에서", "에게", "으로", "를", "을", "가", "이", "the", "and", "with", "for", "this",
    "that", "are", "was", "from",
];

const WORD_PATTERN: &str = r"[가-힣a-zA-Z0-9]+";

static WORD_RUN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(WORD_PATTERN).ok());

/// Hangul syllables, ASCII letters and digits form words; everything else
/// separates them.
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

/// Every maximal run of word characters, in order.
pub fn word_runs(text: &str) -> impl Iterator<Item = &str> {
    // the character scan only runs if the fixed pattern failed to compile
    let (matched, scanned) = match WORD_RUN.as_ref() {
        Some(re) => (Some(re.find_iter(text).map(|m| m.as_str())), None),
        None => (None, Some(scan_runs(text))),
    };
    matched.into_iter().flatten().chain(scanned.into_iter().flatten())
}

fn scan_runs(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !is_word_char(c))
        .filter(|run| !run.is_empty())
}

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Character length, which is what length thresholds are measured in.
pub fn char_len(word: &str) -> usize {
    word.chars().count()
}

/// Turns caption text into keyword tokens.
pub trait KeywordTokenizer: Send + Sync {
    /// Every qualifying token in text order, repeats kept, no cap.
    fn tokens(&self, text: &str) -> Vec<String>;

    /// Upper bound on the length of [`KeywordTokenizer::keywords`].
    fn max_keywords(&self) -> usize;

    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Deduplicated tokens, capped at `max_keywords`.
    ///
    /// Output order is first occurrence but callers must treat it as a set.
    fn keywords(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tokens(text)
            .into_iter()
            .filter(|w| seen.insert(w.clone()))
            .take(self.max_keywords())
            .collect()
    }
}

/// Keywords from regex word runs, no tagger involved.
#[derive(Debug, Clone)]
pub struct RegexTokenizer {
    min_len: usize,
    max_keywords: usize,
}

impl Default for RegexTokenizer {
    fn default() -> Self {
        Self {
            min_len: 2,
            max_keywords: 20,
        }
    }
}

impl RegexTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_keywords(mut self, max_keywords: usize) -> Self {
        self.max_keywords = max_keywords;
        self
    }
}

impl KeywordTokenizer for RegexTokenizer {
    fn tokens(&self, text: &str) -> Vec<String> {
        word_runs(text)
            .filter(|w| char_len(w) >= self.min_len)
            .map(|w| w.to_ascii_lowercase())
            .filter(|w| !is_stopword(w))
            .collect()
    }

    fn max_keywords(&self) -> usize {
        self.max_keywords
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}

/// Keeps only noun-class tokens reported by a morphological tagger.
#[derive(Debug, Clone)]
pub struct TaggerTokenizer<T: MorphTagger> {
    tagger: T,
    min_len: usize,
    max_keywords: usize,
}

impl<T: MorphTagger> TaggerTokenizer<T> {
    pub fn new(tagger: T) -> Self {
        Self {
            tagger,
            min_len: 2,
            max_keywords: 20,
        }
    }

    pub fn with_max_keywords(mut self, max_keywords: usize) -> Self {
        self.max_keywords = max_keywords;
        self
    }
}

impl<T: MorphTagger> KeywordTokenizer for TaggerTokenizer<T> {
    fn tokens(&self, text: &str) -> Vec<String> {
        self.tagger
            .tag(text)
            .into_iter()
            .filter(|t| matches!(t.pos, PartOfSpeech::CommonNoun | PartOfSpeech::ProperNoun))
            .filter(|t| char_len(&t.surface) >= self.min_len)
            .filter(|t| !t.surface.chars().all(|c| c.is_ascii_digit()))
            .map(|t| t.surface.to_ascii_lowercase())
            .collect()
    }

    fn max_keywords(&self) -> usize {
        self.max_keywords
    }

    fn name(&self) -> &'static str {
        "tagger"
    }
}
