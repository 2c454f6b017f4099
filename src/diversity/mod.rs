//! Topic clustering and balanced sampling of captions.
//!
//! Captions are vectorized with a bounded TF-IDF vocabulary, grouped with
//! seeded mini-batch k-means, and each cluster is labeled with its most
//! distinctive nouns and a coarse theme. The sampler then draws a balanced
//! subset either across those clusters or across keyword categories.
//!
//! ```rust,ignore
//! use corpus_forge::diversity::{DiversityClusterer, QuotaSampler};
//!
//! let report = DiversityClusterer::default().cluster(&records, &extractor);
//! let sample = QuotaSampler::new().cluster_stratified(&report.labels, report.k, 1000);
//! ```

mod clustering;
mod labeling;
mod sampling;
mod vectorizer;

pub use clustering::{nearest, ClusterAssignment, MiniBatchKMeans};
pub use labeling::{ClusterLabeler, ClusterSummary, KeywordScore};
pub use sampling::{GroupContribution, QuotaSampler, SampleOutcome, SamplingStrategy};
pub use vectorizer::{squared_distance, TfidfMatrix, TfidfVectorizer};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::categories::RuleSet;
use crate::record::Record;
use crate::text::TextFeatureExtractor;

/// Clustering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub n_clusters: usize,
    pub batch_size: usize,
    pub max_iter: usize,
    pub n_init: usize,
    pub max_features: usize,
    /// Minimum document count of a term.
    pub min_df: usize,
    /// Maximum document fraction of a term.
    pub max_df: f64,
    pub label_sample_size: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            n_clusters: 15,
            batch_size: 1000,
            max_iter: 100,
            n_init: 3,
            max_features: 100,
            min_df: 10,
            max_df: 0.5,
            label_sample_size: 20_000,
        }
    }
}

/// Cluster assignment plus per-cluster summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterReport {
    pub k: usize,
    pub vocabulary: Vec<String>,
    pub inertia: f64,
    /// Cluster id per record, in record order.
    pub labels: Vec<usize>,
    pub clusters: Vec<ClusterSummary>,
}

/// Vectorizes, clusters and labels a corpus.
#[derive(Debug, Clone)]
pub struct DiversityClusterer {
    config: ClusterConfig,
    themes: RuleSet,
    seed: u64,
}

impl Default for DiversityClusterer {
    fn default() -> Self {
        Self::new(ClusterConfig::default())
    }
}

impl DiversityClusterer {
    pub fn new(config: ClusterConfig) -> Self {
        Self {
            config,
            themes: RuleSet::default_themes(),
            seed: 42,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_themes(mut self, themes: RuleSet) -> Self {
        self.themes = themes;
        self
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn cluster(&self, records: &[Record], extractor: &TextFeatureExtractor) -> ClusterReport {
        let docs: Vec<Vec<String>> = records
            .iter()
            .map(|r| extractor.vector_tokens(&r.caption_text()))
            .collect();

        let tfidf = TfidfVectorizer::new(self.config.max_features, self.config.min_df, self.config.max_df)
            .fit_transform(&docs);

        let assignment = MiniBatchKMeans::new(self.config.n_clusters)
            .with_batch_size(self.config.batch_size)
            .with_max_iter(self.config.max_iter)
            .with_n_init(self.config.n_init)
            .with_seed(self.seed)
            .fit(tfidf.matrix.view());

        let clusters = ClusterLabeler::new(self.config.label_sample_size)
            .with_themes(self.themes.clone())
            .with_seed(self.seed)
            .label(records, &assignment.labels, assignment.k, extractor);

        info!(
            records = records.len(),
            features = tfidf.n_features(),
            k = assignment.k,
            inertia = assignment.inertia,
            "Clustered captions"
        );

        ClusterReport {
            k: assignment.k,
            vocabulary: tfidf.vocabulary,
            inertia: assignment.inertia,
            labels: assignment.labels,
            clusters,
        }
    }
}
