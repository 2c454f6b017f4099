//! Keyword co-occurrence network for visualization.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::apriori::for_each_combination;
use super::transactions::Vocabulary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordNode {
    pub keyword: String,
    pub count: usize,
    /// Count over the number of records mined.
    pub frequency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordEdge {
    pub source: String,
    pub target: String,
    pub weight: usize,
    /// Weight over the number of transactions.
    pub support: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordNetwork {
    pub nodes: Vec<KeywordNode>,
    pub edges: Vec<KeywordEdge>,
}

/// Limits for the network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkLimits {
    /// Pairs must occur in more than this fraction of transactions.
    pub min_edge_fraction: f64,
    pub max_edges: usize,
    pub max_nodes: usize,
}

impl Default for NetworkLimits {
    fn default() -> Self {
        Self {
            min_edge_fraction: 0.01,
            max_edges: 30,
            max_nodes: 30,
        }
    }
}

impl KeywordNetwork {
    /// Edges come from the mining transactions; nodes are the most frequent
    /// keywords over every mined record, independent of the mining vocabulary.
    pub fn build(
        transactions: &[Vec<usize>],
        vocab: &Vocabulary,
        keyword_sets: &[Vec<String>],
        limits: NetworkLimits,
    ) -> Self {
        let records_mined = keyword_sets.len();
        let nodes = Vocabulary::top_frequent(keyword_sets, limits.max_nodes)
            .ranked()
            .take(limits.max_nodes)
            .map(|(keyword, count)| KeywordNode {
                keyword: keyword.to_string(),
                count,
                frequency: if records_mined == 0 {
                    0.0
                } else {
                    count as f64 / records_mined as f64
                },
            })
            .collect();

        let mut pair_counts: HashMap<(usize, usize), usize> = HashMap::new();
        let mut buf = Vec::with_capacity(2);
        for t in transactions {
            for_each_combination(t, 2, &mut buf, &mut |pair: &[usize]| {
                *pair_counts.entry((pair[0], pair[1])).or_insert(0) += 1;
            });
        }

        let n = transactions.len() as f64;
        let threshold = n * limits.min_edge_fraction;
        let mut edges: Vec<KeywordEdge> = pair_counts
            .into_iter()
            .filter(|(_, count)| *count as f64 > threshold)
            .map(|((a, b), weight)| {
                let (source, target) = ordered(vocab.term(a), vocab.term(b));
                KeywordEdge {
                    source: source.to_string(),
                    target: target.to_string(),
                    weight,
                    support: weight as f64 / n,
                }
            })
            .collect();

        edges.sort_by(|a, b| {
            b.weight
                .cmp(&a.weight)
                .then_with(|| a.source.cmp(&b.source))
                .then_with(|| a.target.cmp(&b.target))
        });
        edges.truncate(limits.max_edges);

        Self { nodes, edges }
    }
}

fn ordered<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::transactions::build_transactions;

    #[test]
    fn test_network_edges_and_nodes() {
        let keyword_sets: Vec<Vec<String>> = vec![
            vec!["sea".into(), "sky".into()],
            vec!["sea".into(), "sky".into(), "boat".into()],
            vec!["boat".into()],
            vec![],
        ];
        let vocab = Vocabulary::top_frequent(&keyword_sets, 10);
        let transactions = build_transactions(&keyword_sets, &vocab);
        let limits = NetworkLimits {
            min_edge_fraction: 0.4,
            ..Default::default()
        };
        let network = KeywordNetwork::build(&transactions, &vocab, &keyword_sets, limits);

        assert_eq!(network.nodes.len(), 3);
        assert_eq!(network.nodes[0].keyword, "boat");
        assert_eq!(network.nodes[0].frequency, 0.5);

        // 3 transactions: sea-sky twice, the others once (not above 1.2)
        assert_eq!(network.edges.len(), 1);
        assert_eq!(network.edges[0].source, "sea");
        assert_eq!(network.edges[0].target, "sky");
        assert_eq!(network.edges[0].weight, 2);
    }

    #[test]
    fn test_nodes_ignore_mining_vocabulary_size() {
        let keyword_sets: Vec<Vec<String>> = vec![
            vec!["sea".into(), "sky".into(), "boat".into()],
            vec!["sea".into(), "sky".into(), "gull".into()],
            vec!["sea".into(), "gull".into()],
        ];
        let vocab = Vocabulary::top_frequent(&keyword_sets, 1);
        let transactions = build_transactions(&keyword_sets, &vocab);
        let network =
            KeywordNetwork::build(&transactions, &vocab, &keyword_sets, NetworkLimits::default());

        let nodes: Vec<(&str, usize)> = network
            .nodes
            .iter()
            .map(|n| (n.keyword.as_str(), n.count))
            .collect();
        assert_eq!(nodes, vec![("sea", 3), ("gull", 2), ("sky", 2), ("boat", 1)]);
        assert!(network.edges.is_empty());
    }

    #[test]
    fn test_empty_network() {
        let network = KeywordNetwork::build(&[], &Vocabulary::default(), &[], NetworkLimits::default());
        assert!(network.nodes.is_empty());
        assert!(network.edges.is_empty());
    }
}
