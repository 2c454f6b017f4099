//! Morphological tagging.
//!
//! The tagger is an optional capability. [`LexiconTagger`] is a small
//! dictionary-backed implementation: a word run is a noun when it starts with
//! a lexicon entry, and whatever follows the longest such entry (usually a
//! particle or verb ending) is dropped.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::info;

use super::tokenizer::word_runs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartOfSpeech {
    CommonNoun,
    ProperNoun,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub surface: String,
    pub pos: PartOfSpeech,
}

impl TaggedToken {
    pub fn new(surface: impl Into<String>, pos: PartOfSpeech) -> Self {
        Self {
            surface: surface.into(),
            pos,
        }
    }
}

/// Splits text into tagged tokens.
pub trait MorphTagger: Send + Sync {
    fn tag(&self, text: &str) -> Vec<TaggedToken>;
}

/// Noun lookup against a fixed lexicon.
#[derive(Debug, Clone, Default)]
pub struct LexiconTagger {
    nouns: HashMap<String, PartOfSpeech>,
    max_entry_chars: usize,
}

impl LexiconTagger {
    /// Builds a tagger from `(noun, is_proper)` pairs.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        let mut tagger = Self::default();
        for (noun, proper) in entries {
            tagger.insert(noun.into(), proper);
        }
        tagger
    }

    /// Parses a lexicon file: one noun per line, optionally followed by a
    /// tab and `NNP` for proper nouns. Lines starting with `#` are comments.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = fs::read_to_string(path)?;
        let tagger = Self::parse(&content);
        info!(path = %path.display(), entries = tagger.len(), "Loaded noun lexicon");
        Ok(tagger)
    }

    pub fn parse(content: &str) -> Self {
        let mut tagger = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split('\t');
            let Some(noun) = fields.next().map(str::trim).filter(|n| !n.is_empty()) else {
                continue;
            };
            let proper = fields.next().map(str::trim) == Some("NNP");
            tagger.insert(noun.to_string(), proper);
        }
        tagger
    }

    fn insert(&mut self, noun: String, proper: bool) {
        let pos = if proper {
            PartOfSpeech::ProperNoun
        } else {
            PartOfSpeech::CommonNoun
        };
        self.max_entry_chars = self.max_entry_chars.max(noun.chars().count());
        self.nouns.insert(noun, pos);
    }

    pub fn len(&self) -> usize {
        self.nouns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nouns.is_empty()
    }

    /// Longest lexicon entry that prefixes `word`.
    fn longest_prefix<'a>(&self, word: &'a str) -> Option<(&'a str, PartOfSpeech)> {
        let boundaries: Vec<usize> = word
            .char_indices()
            .map(|(i, _)| i)
            .skip(1)
            .chain(std::iter::once(word.len()))
            .take(self.max_entry_chars)
            .collect();

        boundaries.into_iter().rev().find_map(|end| {
            let prefix = &word[..end];
            self.nouns.get(prefix).map(|pos| (prefix, *pos))
        })
    }
}

impl MorphTagger for LexiconTagger {
    fn tag(&self, text: &str) -> Vec<TaggedToken> {
        let mut tokens = Vec::new();
        for word in word_runs(text) {
            match self.longest_prefix(word) {
                Some((noun, pos)) => {
                    tokens.push(TaggedToken::new(noun, pos));
                    let rest = &word[noun.len()..];
                    if !rest.is_empty() {
                        tokens.push(TaggedToken::new(rest, PartOfSpeech::Other));
                    }
                }
                None => tokens.push(TaggedToken::new(word, PartOfSpeech::Other)),
            }
        }
        tokens
    }
}
