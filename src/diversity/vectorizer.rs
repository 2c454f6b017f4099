//! Bounded-vocabulary TF-IDF vectorization.
//!
//! Terms are pruned by document frequency on both ends (rare noise and
//! near-universal words), then capped to the most frequent `max_features`.
//! Weights use smoothed idf `ln((1 + n) / (1 + df)) + 1` and every row is L2
//! normalized.

use std::collections::{HashMap, HashSet};

use ndarray::{Array1, Array2, ArrayView1};

/// TF-IDF vectorizer settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TfidfVectorizer {
    max_features: usize,
    /// Minimum number of documents a term must occur in.
    min_df: usize,
    /// Maximum fraction of documents a term may occur in.
    max_df: f64,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new(100, 10, 0.5)
    }
}

/// Fitted vocabulary and the weighted document-term matrix.
#[derive(Debug, Clone)]
pub struct TfidfMatrix {
    /// Terms in column order (lexical).
    pub vocabulary: Vec<String>,
    pub idf: Array1<f64>,
    /// One L2-normalized row per document.
    pub matrix: Array2<f64>,
}

impl TfidfMatrix {
    pub fn n_docs(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    /// Terms of row `doc` with a positive weight, highest first.
    pub fn top_terms(&self, doc: usize, k: usize) -> Vec<(String, f64)> {
        let row = self.matrix.row(doc);
        let mut weighted: Vec<(usize, f64)> = row
            .iter()
            .enumerate()
            .filter(|(_, &w)| w > 0.0)
            .map(|(i, &w)| (i, w))
            .collect();
        weighted.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        weighted
            .into_iter()
            .take(k)
            .map(|(i, w)| (self.vocabulary[i].clone(), w))
            .collect()
    }
}

impl TfidfVectorizer {
    pub fn new(max_features: usize, min_df: usize, max_df: f64) -> Self {
        Self {
            max_features,
            min_df,
            max_df,
        }
    }

    /// Fits on tokenized documents and returns their weighted vectors.
    ///
    /// When the df bounds leave no term the vocabulary is empty and every
    /// row is a zero-width vector.
    pub fn fit_transform(&self, docs: &[Vec<String>]) -> TfidfMatrix {
        let n_docs = docs.len();

        let mut df: HashMap<&str, usize> = HashMap::new();
        let mut tf_total: HashMap<&str, usize> = HashMap::new();
        for doc in docs {
            let mut seen = HashSet::new();
            for term in doc {
                *tf_total.entry(term.as_str()).or_insert(0) += 1;
                if seen.insert(term.as_str()) {
                    *df.entry(term.as_str()).or_insert(0) += 1;
                }
            }
        }

        let max_doc_count = self.max_df * n_docs as f64;
        let mut kept: Vec<(&str, usize)> = df
            .iter()
            .filter(|(_, &d)| d >= self.min_df && (d as f64) <= max_doc_count)
            .map(|(&term, _)| (term, tf_total.get(term).copied().unwrap_or(0)))
            .collect();
        kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        kept.truncate(self.max_features);

        let mut vocabulary: Vec<String> = kept.iter().map(|(t, _)| t.to_string()).collect();
        vocabulary.sort();
        let column_of: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        let idf = Array1::from_iter(vocabulary.iter().map(|t| {
            let d = df.get(t.as_str()).copied().unwrap_or(0) as f64;
            ((1.0 + n_docs as f64) / (1.0 + d)).ln() + 1.0
        }));

        let mut matrix: Array2<f64> = Array2::zeros((n_docs, vocabulary.len()));
        for (row, doc) in docs.iter().enumerate() {
            for term in doc {
                if let Some(&col) = column_of.get(term.as_str()) {
                    matrix[[row, col]] += 1.0;
                }
            }
            let mut row_view = matrix.row_mut(row);
            row_view *= &idf;
            let norm = row_view.dot(&row_view).sqrt();
            if norm > 1e-10 {
                row_view.mapv_inplace(|x| x / norm);
            }
        }

        TfidfMatrix {
            vocabulary,
            idf,
            matrix,
        }
    }
}

/// Squared Euclidean distance between two rows.
pub fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}
