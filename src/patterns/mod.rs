//! Keyword co-occurrence pattern mining.
//!
//! Records are reduced to keyword transactions over a small vocabulary of the
//! most frequent keywords, then mined with Apriori for association rules. A
//! cheaper pairwise count produces a co-occurrence network for display.

mod apriori;
mod network;
mod rules;
mod transactions;

pub use apriori::{apriori, FrequentItemsets, Itemset};
pub use network::{KeywordEdge, KeywordNetwork, KeywordNode, NetworkLimits};
pub use rules::{derive_rules, AssociationRule};
pub use transactions::{build_transactions, Vocabulary};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::record::Record;
use crate::text::TextFeatureExtractor;

/// Longest itemset Apriori will grow; rule derivation enumerates
/// `2^len` antecedent masks per itemset.
pub const MAX_ITEMSET_LEN: usize = 8;

/// Pattern mining parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Records mined at most; 0 mines everything.
    pub sample_size: usize,
    pub vocabulary_size: usize,
    pub min_support: f64,
    pub max_itemset_len: usize,
    pub min_confidence: f64,
    /// Rules kept in the report.
    pub top_rules: usize,
    pub min_edge_fraction: f64,
    pub max_edges: usize,
    pub max_nodes: usize,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            sample_size: 50_000,
            vocabulary_size: 50,
            min_support: 0.02,
            max_itemset_len: 3,
            min_confidence: 0.4,
            top_rules: 50,
            min_edge_fraction: 0.01,
            max_edges: 30,
            max_nodes: 30,
        }
    }
}

/// Result of one mining run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    pub records_mined: usize,
    pub total_transactions: usize,
    pub vocabulary: Vec<String>,
    pub frequent_itemsets: usize,
    /// Rules meeting the confidence threshold, before truncation.
    pub total_rules: usize,
    pub rules: Vec<AssociationRule>,
    pub network: KeywordNetwork,
}

/// Mines association rules and the keyword network from captions.
#[derive(Debug, Clone)]
pub struct PatternMiner {
    config: MinerConfig,
    seed: u64,
}

impl PatternMiner {
    pub fn new(config: MinerConfig) -> Self {
        Self { config, seed: 42 }
    }

    /// Sets the seed of the record sample.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Mines noun keywords of `records`.
    pub fn mine(&self, records: &[Record], extractor: &TextFeatureExtractor) -> PatternReport {
        let sample = self.sample_indices(records.len());
        let keyword_sets: Vec<Vec<String>> = sample
            .iter()
            .map(|&i| extractor.nouns(&records[i].caption_text()))
            .collect();
        self.mine_keyword_sets(&keyword_sets)
    }

    /// Mines pre-extracted keyword sets, one per record.
    pub fn mine_keyword_sets(&self, keyword_sets: &[Vec<String>]) -> PatternReport {
        let vocab = Vocabulary::top_frequent(keyword_sets, self.config.vocabulary_size);
        let transactions = build_transactions(keyword_sets, &vocab);
        debug!(
            vocabulary = vocab.len(),
            transactions = transactions.len(),
            "Built keyword transactions"
        );

        let frequent = apriori(
            &transactions,
            self.config.min_support,
            self.config.max_itemset_len.min(MAX_ITEMSET_LEN),
        );
        let mut rules = derive_rules(&frequent, &vocab, self.config.min_confidence);
        let total_rules = rules.len();
        rules.truncate(self.config.top_rules);

        let network = KeywordNetwork::build(
            &transactions,
            &vocab,
            keyword_sets,
            NetworkLimits {
                min_edge_fraction: self.config.min_edge_fraction,
                max_edges: self.config.max_edges,
                max_nodes: self.config.max_nodes,
            },
        );

        info!(
            records = keyword_sets.len(),
            transactions = transactions.len(),
            itemsets = frequent.len(),
            rules = total_rules,
            edges = network.edges.len(),
            "Mined keyword patterns"
        );

        PatternReport {
            records_mined: keyword_sets.len(),
            total_transactions: transactions.len(),
            vocabulary: vocab.ranked().map(|(t, _)| t.to_string()).collect(),
            frequent_itemsets: frequent.len(),
            total_rules,
            rules,
            network,
        }
    }

    /// Seeded subset of record positions, in record order.
    fn sample_indices(&self, len: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..len).collect();
        if self.config.sample_size == 0 || len <= self.config.sample_size {
            return indices;
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);
        indices.truncate(self.config.sample_size);
        indices.sort_unstable();
        indices
    }
}

impl Default for PatternMiner {
    fn default() -> Self {
        Self::new(MinerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Caption, MediaKind};

    fn records(captions: &[&str]) -> Vec<Record> {
        captions
            .iter()
            .enumerate()
            .map(|(i, c)| Record::new(i.to_string(), MediaKind::Image, Caption::flat(*c)))
            .collect()
    }

    #[test]
    fn test_mine_finds_cooccurring_keywords() {
        let mut captions = vec!["harbor crane container"; 30];
        captions.extend(vec!["forest trail"; 20]);
        captions.extend(vec!["crane lifting"; 5]);
        let report = PatternMiner::default().mine(&records(&captions), &TextFeatureExtractor::default());

        assert_eq!(report.records_mined, 55);
        assert_eq!(report.total_transactions, 55);
        assert!(report.total_rules > 0);
        let harbor_container = report
            .rules
            .iter()
            .find(|r| r.antecedent == vec!["harbor"] && r.consequent == vec!["container"])
            .unwrap();
        assert_eq!(harbor_container.confidence, 1.0);
        assert!(report.network.edges.iter().any(|e| e.source == "forest" && e.target == "trail"));
    }

    #[test]
    fn test_sample_is_bounded_and_seeded() {
        let config = MinerConfig {
            sample_size: 10,
            ..Default::default()
        };
        let miner = PatternMiner::new(config).with_seed(7);
        let a = miner.sample_indices(100);
        let b = miner.sample_indices(100);

        assert_eq!(a.len(), 10);
        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_rules_truncated_but_total_reported() {
        let config = MinerConfig {
            top_rules: 1,
            ..Default::default()
        };
        let captions = vec!["red green blue"; 10];
        let report = PatternMiner::new(config).mine(&records(&captions), &TextFeatureExtractor::default());

        assert_eq!(report.rules.len(), 1);
        assert_eq!(report.total_rules, 12);
    }

    #[test]
    fn test_itemset_length_is_capped() {
        let config = MinerConfig {
            max_itemset_len: 40,
            ..Default::default()
        };
        let captions = vec!["aa bb cc dd ee ff gg hh ii"; 5];
        let report = PatternMiner::new(config).mine(&records(&captions), &TextFeatureExtractor::default());

        // every subset of the 9 words with 2..=8 items, split every way
        assert_eq!(report.total_rules, 18_150);
        let longest = report
            .rules
            .iter()
            .map(|r| r.antecedent.len() + r.consequent.len())
            .max();
        assert!(longest.unwrap() <= MAX_ITEMSET_LEN);
    }

    #[test]
    fn test_empty_corpus() {
        let report = PatternMiner::default().mine(&[], &TextFeatureExtractor::default());
        assert_eq!(report, PatternReport::default());
    }
}
