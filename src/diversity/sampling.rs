//! Quota sampling of a bounded, balanced subset.
//!
//! Two strategies share one outcome shape:
//! - cluster-stratified: an equal random share of every cluster
//! - category-quota: the best-scoring records of every keyword category
//!
//! Both fill any shortfall globally, never select a record twice, and shuffle
//! the final selection so group order does not leak into training batches.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::categories::RuleSet;
use crate::quality::SampleScorer;
use crate::record::Record;

/// Available sampling strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingStrategy {
    /// Equal random share per cluster.
    Cluster,
    /// Top quality-scored records per category.
    Category,
}

impl std::fmt::Display for SamplingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SamplingStrategy::Cluster => write!(f, "cluster"),
            SamplingStrategy::Category => write!(f, "category"),
        }
    }
}

/// What one group contributed to the sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupContribution {
    pub group: String,
    pub available: usize,
    pub quota: usize,
    pub selected: usize,
}

/// Selected record positions plus how the target was met.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleOutcome {
    pub strategy: SamplingStrategy,
    /// Positions into the record slice, shuffled.
    pub indices: Vec<usize>,
    pub target: usize,
    pub quota_per_group: usize,
    pub groups: Vec<GroupContribution>,
    /// Records added after the per-group pass.
    pub fill_count: usize,
    /// How far the sample stays below the target.
    pub shortfall: usize,
}

impl SampleOutcome {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Tracks which records are taken, in selection order.
struct Selection {
    taken: Vec<bool>,
    order: Vec<usize>,
}

impl Selection {
    fn new(len: usize) -> Self {
        Self {
            taken: vec![false; len],
            order: Vec::new(),
        }
    }

    fn take(&mut self, idx: usize) -> bool {
        if self.taken[idx] {
            return false;
        }
        self.taken[idx] = true;
        self.order.push(idx);
        true
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Deterministic quota sampler.
#[derive(Debug, Clone)]
pub struct QuotaSampler {
    seed: u64,
}

impl Default for QuotaSampler {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

impl QuotaSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the seed used for every shuffle.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Cluster-stratified sampling.
    ///
    /// Every cluster (ascending id) gives up to `target / k` randomly chosen
    /// members; the remainder comes from the shuffled unselected pool.
    pub fn cluster_stratified(&self, labels: &[usize], k: usize, target: usize) -> SampleOutcome {
        let mut rng = self.create_rng();
        let mut selection = Selection::new(labels.len());
        let quota = if k == 0 { 0 } else { target / k };

        let mut members: Vec<Vec<usize>> = vec![Vec::new(); k];
        for (idx, &label) in labels.iter().enumerate() {
            if label < k {
                members[label].push(idx);
            }
        }

        let mut groups = Vec::with_capacity(k);
        for (cluster, points) in members.iter_mut().enumerate() {
            let available = points.len();
            points.shuffle(&mut rng);
            let selected = points
                .iter()
                .filter(|&&idx| selection.len() < target && selection.take(idx))
                .take(quota)
                .count();
            groups.push(GroupContribution {
                group: cluster.to_string(),
                available,
                quota,
                selected,
            });
        }

        let mut remaining: Vec<usize> = (0..labels.len()).filter(|&i| !selection.taken[i]).collect();
        remaining.shuffle(&mut rng);
        let fill_count = fill(&mut selection, remaining, target);

        self.finish(SamplingStrategy::Cluster, selection, target, quota, groups, fill_count, &mut rng)
    }

    /// Category-quota sampling with score ranking, scoring with `scorer`.
    pub fn category_quota(
        &self,
        records: &[Record],
        rules: &RuleSet,
        scorer: &dyn SampleScorer,
        target: usize,
    ) -> SampleOutcome {
        let scores: Vec<f64> = records.iter().map(|r| scorer.score(r)).collect();
        self.category_quota_scored(records, rules, &scores, target)
    }

    /// Category-quota sampling with precomputed scores, one per record.
    ///
    /// A record joins every category whose keywords it mentions, or "other"
    /// when it mentions none. Each non-empty category gets
    /// `target / non-empty categories` of its best-scoring records not
    /// already taken; the rest is filled by score across the whole corpus.
    pub fn category_quota_scored(
        &self,
        records: &[Record],
        rules: &RuleSet,
        scores: &[f64],
        target: usize,
    ) -> SampleOutcome {
        let mut rng = self.create_rng();
        let n = records.len().min(scores.len());
        let mut selection = Selection::new(n);

        let labels = rules.labels_with_other();
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); labels.len()];
        for (idx, record) in records.iter().take(n).enumerate() {
            for category in rules.classify(&record.caption_text()) {
                if let Some(pos) = labels.iter().position(|l| *l == category) {
                    members[pos].push(idx);
                }
            }
        }

        let non_empty = members.iter().filter(|m| !m.is_empty()).count();
        let quota = if non_empty == 0 { 0 } else { target / non_empty };
        if non_empty == 0 && n > 0 {
            warn!("No category has members, filling by score only");
        }

        let mut groups = Vec::with_capacity(labels.len());
        for (label, mut points) in labels.into_iter().zip(members) {
            let available = points.len();
            rank_by_score(&mut points, scores);
            let selected = points
                .iter()
                .filter(|&&idx| selection.len() < target && selection.take(idx))
                .take(quota)
                .count();
            groups.push(GroupContribution {
                group: label,
                available,
                quota,
                selected,
            });
        }

        let mut remaining: Vec<usize> = (0..n).filter(|&i| !selection.taken[i]).collect();
        rank_by_score(&mut remaining, scores);
        let fill_count = fill(&mut selection, remaining, target);

        self.finish(SamplingStrategy::Category, selection, target, quota, groups, fill_count, &mut rng)
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        strategy: SamplingStrategy,
        selection: Selection,
        target: usize,
        quota: usize,
        groups: Vec<GroupContribution>,
        fill_count: usize,
        rng: &mut ChaCha8Rng,
    ) -> SampleOutcome {
        let mut indices = selection.order;
        indices.shuffle(rng);
        let shortfall = target.saturating_sub(indices.len());

        info!(
            strategy = %strategy,
            target,
            selected = indices.len(),
            quota_per_group = quota,
            fill_count,
            shortfall,
            "Sampled subset"
        );

        SampleOutcome {
            strategy,
            indices,
            target,
            quota_per_group: quota,
            groups,
            fill_count,
            shortfall,
        }
    }

    fn create_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed)
    }
}

/// Highest score first; equal scores keep record order.
fn rank_by_score(indices: &mut [usize], scores: &[f64]) {
    indices.sort_by_key(|&i| (Reverse(OrderedFloat(scores[i])), i));
}

fn fill(selection: &mut Selection, candidates: Vec<usize>, target: usize) -> usize {
    let mut added = 0;
    for idx in candidates {
        if selection.len() >= target {
            break;
        }
        if selection.take(idx) {
            added += 1;
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::KeywordRule;
    use crate::record::{Caption, MediaKind};
    use std::collections::HashSet;

    fn assert_unique(indices: &[usize]) {
        let set: HashSet<usize> = indices.iter().copied().collect();
        assert_eq!(set.len(), indices.len());
    }

    #[test]
    fn test_stratified_equal_share() {
        // 10 clusters of 50
        let labels: Vec<usize> = (0..500).map(|i| i % 10).collect();
        let outcome = QuotaSampler::new().cluster_stratified(&labels, 10, 100);

        assert_eq!(outcome.len(), 100);
        assert_eq!(outcome.fill_count, 0);
        assert_eq!(outcome.shortfall, 0);
        assert_unique(&outcome.indices);
        for cluster in 0..10 {
            let count = outcome.indices.iter().filter(|&&i| labels[i] == cluster).count();
            assert_eq!(count, 10);
        }
    }

    #[test]
    fn test_small_cluster_is_filled_from_pool() {
        let mut labels: Vec<usize> = (0..200).map(|i| 1 + i % 9).collect();
        labels.extend([0, 0]);
        let outcome = QuotaSampler::new().cluster_stratified(&labels, 10, 100);

        assert_eq!(outcome.len(), 100);
        assert_eq!(outcome.groups[0].selected, 2);
        assert_eq!(outcome.fill_count, 8);
        assert_unique(&outcome.indices);
    }

    #[test]
    fn test_stratified_small_corpus_reports_shortfall() {
        let labels = vec![0, 1, 1];
        let outcome = QuotaSampler::new().cluster_stratified(&labels, 2, 10);
        assert_eq!(outcome.len(), 3);
        assert_eq!(outcome.shortfall, 7);
    }

    #[test]
    fn test_stratified_is_reproducible() {
        let labels: Vec<usize> = (0..300).map(|i| i % 7).collect();
        let a = QuotaSampler::new().with_seed(3).cluster_stratified(&labels, 7, 50);
        let b = QuotaSampler::new().with_seed(3).cluster_stratified(&labels, 7, 50);
        assert_eq!(a.indices, b.indices);
    }

    fn categorized(captions: &[&str]) -> Vec<Record> {
        captions
            .iter()
            .enumerate()
            .map(|(i, c)| Record::new(i.to_string(), MediaKind::Image, Caption::flat(*c)))
            .collect()
    }

    fn two_rules() -> RuleSet {
        RuleSet::new(vec![
            KeywordRule::new("sea", &["ocean", "beach"]),
            KeywordRule::new("city", &["street", "tower"]),
        ])
    }

    #[test]
    fn test_multi_category_membership() {
        let records = categorized(&["ocean by the street", "ocean", "tower", "nothing"]);
        let scores = vec![1.0, 2.0, 3.0, 4.0];
        let outcome = QuotaSampler::new().category_quota_scored(&records, &two_rules(), &scores, 4);

        assert_eq!(outcome.groups[0].available, 2);
        assert_eq!(outcome.groups[1].available, 2);
        assert_eq!(outcome.groups[2].group, "other");
        assert_eq!(outcome.groups[2].available, 1);
        assert_eq!(outcome.len(), 4);
        assert_unique(&outcome.indices);
    }

    #[test]
    fn test_category_takes_top_scores() {
        let records = categorized(&["ocean"; 10]);
        let scores: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let outcome = QuotaSampler::new().category_quota_scored(&records, &two_rules(), &scores, 3);

        let mut picked = outcome.indices.clone();
        picked.sort();
        assert_eq!(picked, vec![7, 8, 9]);
        assert_eq!(outcome.quota_per_group, 3);
    }

    #[test]
    fn test_category_fill_by_score() {
        let mut captions = vec!["ocean"; 2];
        captions.extend(vec!["tower"; 20]);
        let records = categorized(&captions);
        let scores: Vec<f64> = (0..22).map(|i| i as f64).collect();
        let outcome = QuotaSampler::new().category_quota_scored(&records, &two_rules(), &scores, 10);

        // quota 5 per non-empty category: 2 sea + 5 city, then 3 by score
        assert_eq!(outcome.groups[0].selected, 2);
        assert_eq!(outcome.groups[1].selected, 5);
        assert_eq!(outcome.fill_count, 3);
        let mut picked = outcome.indices.clone();
        picked.sort();
        assert_eq!(picked, vec![0, 1, 14, 15, 16, 17, 18, 19, 20, 21]);
    }

    #[test]
    fn test_category_with_scorer_closure() {
        let records = categorized(&["ocean a", "ocean bb", "ocean ccc"]);
        let by_len = |r: &Record| r.caption_text().len() as f64;
        let outcome = QuotaSampler::new().category_quota(&records, &two_rules(), &by_len, 1);
        assert_eq!(outcome.indices, vec![2]);
    }

    #[test]
    fn test_empty_inputs() {
        let outcome = QuotaSampler::new().category_quota_scored(&[], &two_rules(), &[], 5);
        assert!(outcome.is_empty());
        assert_eq!(outcome.shortfall, 5);

        let outcome = QuotaSampler::new().cluster_stratified(&[], 0, 5);
        assert!(outcome.is_empty());
        assert_eq!(outcome.shortfall, 5);
    }
}
