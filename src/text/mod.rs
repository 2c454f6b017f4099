//! Caption tokenization.
//!
//! - [`TextFeatureExtractor`]: word tokens, keywords, vector tokens and nouns
//! - [`KeywordTokenizer`]: pluggable keyword source (regex or tagger backed)
//! - [`LexiconTagger`]: dictionary-backed noun tagger

pub mod extractor;
pub mod tagger;
pub mod tokenizer;

pub use extractor::TextFeatureExtractor;
pub use tagger::{LexiconTagger, MorphTagger, PartOfSpeech, TaggedToken};
pub use tokenizer::{KeywordTokenizer, RegexTokenizer, TaggerTokenizer};
