//! Text feature extraction over caption strings.

use std::fmt;
use std::sync::Arc;

use super::tagger::MorphTagger;
use super::tokenizer::{char_len, word_runs, KeywordTokenizer, RegexTokenizer, TaggerTokenizer};

/// Extracts lexical units from captions for statistics, mining and
/// vectorization.
///
/// Constructed once and passed to every stage that needs it. Cloning is
/// cheap; the noun tokenizer is shared.
#[derive(Clone)]
pub struct TextFeatureExtractor {
    regex: RegexTokenizer,
    nouns: Arc<dyn KeywordTokenizer>,
}

impl fmt::Debug for TextFeatureExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextFeatureExtractor")
            .field("max_keywords", &self.regex.max_keywords())
            .field("noun_tokenizer", &self.nouns.name())
            .finish()
    }
}

impl Default for TextFeatureExtractor {
    fn default() -> Self {
        Self::new(20)
    }
}

impl TextFeatureExtractor {
    /// Extractor whose noun mode falls back to regex keywords.
    pub fn new(max_keywords: usize) -> Self {
        let regex = RegexTokenizer::new().with_max_keywords(max_keywords);
        Self {
            nouns: Arc::new(regex.clone()),
            regex,
        }
    }

    /// Extractor whose noun mode goes through `tagger`.
    pub fn with_tagger<T: MorphTagger + 'static>(max_keywords: usize, tagger: T) -> Self {
        Self::new(max_keywords).with_noun_tokenizer(Arc::new(
            TaggerTokenizer::new(tagger).with_max_keywords(max_keywords),
        ))
    }

    pub fn with_noun_tokenizer(mut self, tokenizer: Arc<dyn KeywordTokenizer>) -> Self {
        self.nouns = tokenizer;
        self
    }

    /// Name of the tokenizer used for nouns.
    pub fn noun_mode(&self) -> &'static str {
        self.nouns.name()
    }

    /// Deduplicated keywords of length 2 or more, stop-words removed.
    pub fn keywords(&self, text: &str) -> Vec<String> {
        self.regex.keywords(text)
    }

    /// Noun-class keywords through the configured tokenizer.
    pub fn nouns(&self, text: &str) -> Vec<String> {
        self.nouns.keywords(text)
    }

    /// Noun-class tokens with every repeat kept and no cap.
    pub fn noun_stream(&self, text: &str) -> Vec<String> {
        self.nouns.tokens(text)
    }

    /// Every word run with repetition, as written.
    pub fn word_tokens(&self, text: &str) -> Vec<String> {
        word_runs(text).map(str::to_string).collect()
    }

    /// Word runs of length 2 or more with repetition, lowercased.
    pub fn vector_tokens(&self, text: &str) -> Vec<String> {
        word_runs(text)
            .filter(|w| char_len(w) >= 2)
            .map(|w| w.to_ascii_lowercase())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::tagger::LexiconTagger;

    #[test]
    fn test_token_modes_differ() {
        let extractor = TextFeatureExtractor::default();
        let text = "Bus 버스 bus 가";

        assert_eq!(extractor.word_tokens(text), vec!["Bus", "버스", "bus", "가"]);
        assert_eq!(extractor.vector_tokens(text), vec!["bus", "버스", "bus"]);
        assert_eq!(extractor.keywords(text), vec!["bus", "버스"]);
    }

    #[test]
    fn test_nouns_fall_back_to_keywords_without_tagger() {
        let extractor = TextFeatureExtractor::default();
        assert_eq!(extractor.noun_mode(), "regex");
        assert_eq!(
            extractor.nouns("전통 시장의 풍경"),
            extractor.keywords("전통 시장의 풍경")
        );
    }

    #[test]
    fn test_noun_stream_keeps_repeats() {
        let tagger = LexiconTagger::from_entries([("시장", false), ("풍경", false)]);
        let extractor = TextFeatureExtractor::with_tagger(1, tagger);
        assert_eq!(extractor.nouns("시장 풍경 시장의 시장"), vec!["시장"]);
        assert_eq!(
            extractor.noun_stream("시장 풍경 시장의 시장"),
            vec!["시장", "풍경", "시장", "시장"]
        );
    }

    #[test]
    fn test_nouns_through_tagger() {
        let tagger = LexiconTagger::from_entries([("시장", false), ("풍경", false)]);
        let extractor = TextFeatureExtractor::with_tagger(20, tagger);
        assert_eq!(extractor.noun_mode(), "tagger");
        assert_eq!(extractor.nouns("전통 시장의 풍경"), vec!["시장", "풍경"]);
    }
}
