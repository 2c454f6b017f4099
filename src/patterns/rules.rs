//! Association rules derived from frequent itemsets.

use serde::{Deserialize, Serialize};

use super::apriori::{FrequentItemsets, Itemset};
use super::transactions::Vocabulary;

/// `antecedent => consequent` with its interestingness measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRule {
    pub antecedent: Vec<String>,
    pub consequent: Vec<String>,
    /// Fraction of transactions containing both sides.
    pub support: f64,
    /// support(both) / support(antecedent).
    pub confidence: f64,
    /// confidence / support(consequent).
    pub lift: f64,
}

/// Every rule meeting `min_confidence`, best lift first.
///
/// Ties on lift fall back to confidence, support, then the keywords
/// themselves so the order is fully determined.
pub fn derive_rules(
    frequent: &FrequentItemsets,
    vocab: &Vocabulary,
    min_confidence: f64,
) -> Vec<AssociationRule> {
    let mut rules = Vec::new();

    for itemset in frequent.itemsets() {
        if itemset.len() < 2 {
            continue;
        }
        let Some(support) = frequent.support(itemset) else {
            continue;
        };

        // Each bit mask below full is a proper, non-empty antecedent.
        let full = (1u32 << itemset.len()) - 1;
        for mask in 1..full {
            let (antecedent, consequent) = split_by_mask(itemset, mask);
            let (Some(ant_support), Some(cons_support)) =
                (frequent.support(&antecedent), frequent.support(&consequent))
            else {
                continue;
            };
            if ant_support <= 0.0 || cons_support <= 0.0 {
                continue;
            }

            let confidence = (support / ant_support).min(1.0);
            if confidence < min_confidence {
                continue;
            }
            rules.push(AssociationRule {
                antecedent: terms(&antecedent, vocab),
                consequent: terms(&consequent, vocab),
                support,
                confidence,
                lift: confidence / cons_support,
            });
        }
    }

    rules.sort_by(|a, b| {
        b.lift
            .total_cmp(&a.lift)
            .then_with(|| b.confidence.total_cmp(&a.confidence))
            .then_with(|| b.support.total_cmp(&a.support))
            .then_with(|| a.antecedent.cmp(&b.antecedent))
            .then_with(|| a.consequent.cmp(&b.consequent))
    });
    rules
}

fn split_by_mask(itemset: &[usize], mask: u32) -> (Itemset, Itemset) {
    let mut antecedent = Vec::new();
    let mut consequent = Vec::new();
    for (bit, &item) in itemset.iter().enumerate() {
        if mask & (1 << bit) != 0 {
            antecedent.push(item);
        } else {
            consequent.push(item);
        }
    }
    (antecedent, consequent)
}

fn terms(ids: &[usize], vocab: &Vocabulary) -> Vec<String> {
    let mut terms: Vec<String> = ids.iter().map(|&id| vocab.term(id).to_string()).collect();
    terms.sort();
    terms
}
