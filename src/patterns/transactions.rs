//! Keyword vocabulary and transaction building.

use std::collections::{BTreeSet, HashMap};

/// Keywords kept for mining, indexed by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    terms: Vec<String>,
    counts: Vec<usize>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// The `size` most frequent keywords across `keyword_sets`.
    ///
    /// Frequency is the number of sets a keyword occurs in; ties are broken
    /// lexically so the vocabulary does not depend on hash order.
    pub fn top_frequent(keyword_sets: &[Vec<String>], size: usize) -> Self {
        let mut frequencies: HashMap<&str, usize> = HashMap::new();
        for set in keyword_sets {
            let unique: BTreeSet<&str> = set.iter().map(String::as_str).collect();
            for keyword in unique {
                *frequencies.entry(keyword).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> = frequencies.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(size);

        let mut vocab = Self::default();
        for (term, count) in ranked {
            vocab.index.insert(term.to_string(), vocab.terms.len());
            vocab.terms.push(term.to_string());
            vocab.counts.push(count);
        }
        vocab
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn term(&self, id: usize) -> &str {
        &self.terms[id]
    }

    pub fn id(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    /// `(term, document count)` in rank order.
    pub fn ranked(&self) -> impl Iterator<Item = (&str, usize)> {
        self.terms
            .iter()
            .map(String::as_str)
            .zip(self.counts.iter().copied())
    }

    /// Sorted, deduplicated vocabulary ids present in `keywords`.
    pub fn restrict(&self, keywords: &[String]) -> Vec<usize> {
        let ids: BTreeSet<usize> = keywords.iter().filter_map(|k| self.id(k)).collect();
        ids.into_iter().collect()
    }
}

/// One transaction per keyword set that keeps at least one vocabulary term.
pub fn build_transactions(keyword_sets: &[Vec<String>], vocab: &Vocabulary) -> Vec<Vec<usize>> {
    keyword_sets
        .iter()
        .map(|set| vocab.restrict(set))
        .filter(|t| !t.is_empty())
        .collect()
}
