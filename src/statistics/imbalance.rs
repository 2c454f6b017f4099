//! Class distribution and imbalance measures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Imbalance of one categorical field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassImbalance {
    pub counts: BTreeMap<String, usize>,
    /// Largest class count over smallest. 1.0 for one class, 0.0 for none.
    pub imbalance_ratio: f64,
    pub gini: f64,
    pub entropy: f64,
    pub normalized_entropy: f64,
}

impl ClassImbalance {
    /// Counts labels, ignoring empty ones.
    pub fn from_labels<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for label in labels {
            let label = label.trim();
            if label.is_empty() {
                continue;
            }
            *counts.entry(label.to_string()).or_insert(0) += 1;
        }
        Self::from_counts(counts)
    }

    pub fn from_counts(counts: BTreeMap<String, usize>) -> Self {
        let values: Vec<usize> = counts.values().copied().collect();
        Self {
            imbalance_ratio: imbalance_ratio(&values),
            gini: gini_coefficient(&values),
            entropy: shannon_entropy(&values),
            normalized_entropy: normalized_entropy(&values),
            counts,
        }
    }

    pub fn class_count(&self) -> usize {
        self.counts.len()
    }
}

/// Max count over min count.
pub fn imbalance_ratio(counts: &[usize]) -> f64 {
    let (Some(max), Some(min)) = (counts.iter().max(), counts.iter().min()) else {
        return 0.0;
    };
    if *min == 0 {
        return 0.0;
    }
    *max as f64 / *min as f64
}

/// Gini coefficient of class counts.
///
/// 0 for perfectly equal classes, approaching 1 as one class dominates.
pub fn gini_coefficient(counts: &[usize]) -> f64 {
    if counts.is_empty() {
        return 0.0;
    }

    let mut values: Vec<f64> = counts.iter().map(|&v| v as f64).collect();
    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len() as f64;
    let total: f64 = values.iter().sum();
    if total == 0.0 {
        return 0.0;
    }

    let mut gini_sum = 0.0;
    for (i, &value) in values.iter().enumerate() {
        gini_sum += (2.0 * (i as f64 + 1.0) - n - 1.0) * value;
    }

    gini_sum / (n * total)
}

/// Shannon entropy in nats.
pub fn shannon_entropy(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;

    counts
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.ln()
        })
        .sum()
}

/// Entropy divided by its maximum for the number of classes.
pub fn normalized_entropy(counts: &[usize]) -> f64 {
    let max_entropy = (counts.len() as f64).ln();
    if max_entropy > 0.0 {
        (shannon_entropy(counts) / max_entropy).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gini_balanced_is_zero() {
        assert!(gini_coefficient(&[100, 100, 100, 100]).abs() < 1e-12);
    }

    #[test]
    fn test_gini_dominated_approaches_one() {
        let mut counts = vec![0usize; 99];
        counts.push(1000);
        let gini = gini_coefficient(&counts);
        // n = 100: maximum is (n - 1) / n
        assert!((gini - 0.99).abs() < 1e-12);
    }

    #[test]
    fn test_imbalance_ratio() {
        assert_eq!(imbalance_ratio(&[]), 0.0);
        assert_eq!(imbalance_ratio(&[7]), 1.0);
        assert_eq!(imbalance_ratio(&[10, 40, 20]), 4.0);
    }

    #[test]
    fn test_entropy_uniform() {
        let entropy = shannon_entropy(&[10, 10]);
        assert!((entropy - 2f64.ln()).abs() < 1e-12);
        assert!((normalized_entropy(&[10, 10]) - 1.0).abs() < 1e-12);
        assert_eq!(normalized_entropy(&[10]), 0.0);
    }

    #[test]
    fn test_from_labels_ignores_empty() {
        let imbalance = ClassImbalance::from_labels(["video", "image", "video", "", "video"]);
        assert_eq!(imbalance.class_count(), 2);
        assert_eq!(imbalance.counts["video"], 3);
        assert_eq!(imbalance.imbalance_ratio, 3.0);
        assert!(imbalance.gini > 0.0);
    }

    #[test]
    fn test_empty_labels() {
        let imbalance = ClassImbalance::from_labels(Vec::<&str>::new());
        assert_eq!(imbalance.class_count(), 0);
        assert_eq!(imbalance.imbalance_ratio, 0.0);
        assert_eq!(imbalance.gini, 0.0);
    }
}
