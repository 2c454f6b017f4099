//! Level-wise frequent itemset discovery.

use std::collections::{HashMap, HashSet};

/// Sorted vocabulary ids.
pub type Itemset = Vec<usize>;

/// Frequent itemsets with their transaction counts.
#[derive(Debug, Clone, Default)]
pub struct FrequentItemsets {
    counts: HashMap<Itemset, usize>,
    transactions: usize,
}

impl FrequentItemsets {
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn transactions(&self) -> usize {
        self.transactions
    }

    /// Fraction of transactions containing `itemset`, if it is frequent.
    pub fn support(&self, itemset: &[usize]) -> Option<f64> {
        self.counts
            .get(itemset)
            .map(|&c| c as f64 / self.transactions as f64)
    }

    /// Itemsets sorted by size, then ids.
    pub fn itemsets(&self) -> Vec<&Itemset> {
        let mut sets: Vec<&Itemset> = self.counts.keys().collect();
        sets.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        sets
    }
}

/// Apriori over transactions of sorted, deduplicated ids.
pub fn apriori(transactions: &[Vec<usize>], min_support: f64, max_len: usize) -> FrequentItemsets {
    let n = transactions.len();
    let mut result = FrequentItemsets {
        counts: HashMap::new(),
        transactions: n,
    };
    if n == 0 || max_len == 0 {
        return result;
    }
    let is_frequent = |count: usize| count > 0 && count as f64 / n as f64 >= min_support;

    let mut singles: HashMap<Itemset, usize> = HashMap::new();
    for t in transactions {
        for &item in t {
            *singles.entry(vec![item]).or_insert(0) += 1;
        }
    }
    let mut level: Vec<Itemset> = singles
        .into_iter()
        .filter(|(_, c)| is_frequent(*c))
        .map(|(set, c)| {
            result.counts.insert(set.clone(), c);
            set
        })
        .collect();

    let mut k = 2;
    while k <= max_len && !level.is_empty() {
        let candidates = generate_candidates(&mut level);
        if candidates.is_empty() {
            break;
        }

        let mut counts: HashMap<&Itemset, usize> = HashMap::new();
        let mut buf = Vec::with_capacity(k);
        for t in transactions {
            if t.len() < k {
                continue;
            }
            for_each_combination(t, k, &mut buf, &mut |subset: &[usize]| {
                if let Some(candidate) = candidates.get(subset) {
                    *counts.entry(candidate).or_insert(0) += 1;
                }
            });
        }

        level = counts
            .into_iter()
            .filter(|(_, c)| is_frequent(*c))
            .map(|(set, c)| {
                result.counts.insert(set.clone(), c);
                set.clone()
            })
            .collect();
        k += 1;
    }

    result
}

/// Joins itemsets sharing all but their last id, keeping only candidates
/// whose every subset of one size smaller is frequent.
fn generate_candidates(level: &mut [Itemset]) -> HashSet<Itemset> {
    level.sort();
    let frequent: HashSet<&Itemset> = level.iter().collect();
    let mut candidates = HashSet::new();

    for i in 0..level.len() {
        for j in (i + 1)..level.len() {
            let (a, b) = (&level[i], &level[j]);
            let prefix = a.len() - 1;
            if a[..prefix] != b[..prefix] {
                break;
            }
            let mut candidate = a.clone();
            candidate.push(b[prefix]);

            let all_subsets_frequent = (0..candidate.len()).all(|skip| {
                let subset: Itemset = candidate
                    .iter()
                    .enumerate()
                    .filter(|(idx, _)| *idx != skip)
                    .map(|(_, &id)| id)
                    .collect();
                frequent.contains(&subset)
            });
            if all_subsets_frequent {
                candidates.insert(candidate);
            }
        }
    }
    candidates
}

/// Calls `f` with every `k`-combination of `items`, in lexical order.
pub(crate) fn for_each_combination<F>(items: &[usize], k: usize, buf: &mut Vec<usize>, f: &mut F)
where
    F: FnMut(&[usize]),
{
    fn recurse<F: FnMut(&[usize])>(
        items: &[usize],
        start: usize,
        k: usize,
        buf: &mut Vec<usize>,
        f: &mut F,
    ) {
        if buf.len() == k {
            f(buf.as_slice());
            return;
        }
        let needed = k - buf.len();
        for i in start..=items.len().saturating_sub(needed) {
            if i >= items.len() {
                break;
            }
            buf.push(items[i]);
            recurse(items, i + 1, k, buf, f);
            buf.pop();
        }
    }

    buf.clear();
    if k == 0 || k > items.len() {
        return;
    }
    recurse(items, 0, k, buf, f);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinations() {
        let mut seen = Vec::new();
        let mut buf = Vec::new();
        for_each_combination(&[1, 2, 3, 4], 2, &mut buf, &mut |c: &[usize]| seen.push(c.to_vec()));
        assert_eq!(
            seen,
            vec![vec![1, 2], vec![1, 3], vec![1, 4], vec![2, 3], vec![2, 4], vec![3, 4]]
        );
    }

    #[test]
    fn test_apriori_finds_pairs_and_triples() {
        let transactions = vec![
            vec![0, 1, 2],
            vec![0, 1, 2],
            vec![0, 1],
            vec![3],
            vec![0, 3],
        ];
        let frequent = apriori(&transactions, 0.4, 3);

        assert_eq!(frequent.support(&[0]), Some(0.8));
        assert_eq!(frequent.support(&[0, 1]), Some(0.6));
        assert_eq!(frequent.support(&[0, 1, 2]), Some(0.4));
        assert_eq!(frequent.support(&[0, 3]), None);
        assert_eq!(frequent.support(&[3]), Some(0.4));
    }

    #[test]
    fn test_apriori_respects_max_len() {
        let transactions = vec![vec![0, 1, 2]; 4];
        let frequent = apriori(&transactions, 0.5, 2);
        assert!(frequent.itemsets().iter().all(|s| s.len() <= 2));
        assert_eq!(frequent.len(), 6);
    }

    #[test]
    fn test_apriori_nothing_frequent() {
        let transactions = vec![vec![0], vec![1], vec![2]];
        let frequent = apriori(&transactions, 0.5, 3);
        assert!(frequent.is_empty());

        assert!(apriori(&[], 0.1, 3).is_empty());
    }
}
