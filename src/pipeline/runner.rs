//! Curation pipeline runner.
//!
//! Drives one corpus through scoring, statistics, pattern mining, clustering
//! and sampling. Each stage is also callable on its own so the CLI can run a
//! single analysis.

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::config::CurationConfig;
use crate::diversity::{
    ClusterReport, DiversityClusterer, QuotaSampler, SampleOutcome, SamplingStrategy,
};
use crate::patterns::{PatternMiner, PatternReport};
use crate::quality::{
    CaptionInspector, HeuristicScorer, QualityReport, QualityScorer, SampleScorer,
};
use crate::record::{LoadStats, LoadedCorpus, Record};
use crate::statistics::CorpusStatistics;
use crate::text::TextFeatureExtractor;

/// Headline numbers of a curation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurationSummary {
    pub total_records: usize,
    pub skipped_on_load: usize,
    pub quality_passed: usize,
    pub quality_pass_rate: f64,
    pub structured_records: usize,
    pub clusters: usize,
    pub rules_found: usize,
    pub strategy: SamplingStrategy,
    pub target_size: usize,
    pub curated_records: usize,
    pub shortfall: usize,
    pub seed: u64,
    pub noun_mode: String,
    pub elapsed_ms: u64,
}

/// Everything a full run produces.
#[derive(Debug, Clone)]
pub struct CurationOutcome {
    /// Loaded records with quality flags written back.
    pub records: Vec<Record>,
    pub load_stats: LoadStats,
    pub quality: Vec<QualityReport>,
    pub statistics: CorpusStatistics,
    pub patterns: PatternReport,
    pub clusters: ClusterReport,
    pub sample: SampleOutcome,
    pub summary: CurationSummary,
}

impl CurationOutcome {
    /// Records in sample order.
    pub fn curated_records(&self) -> Vec<&Record> {
        self.sample.indices.iter().map(|&i| &self.records[i]).collect()
    }
}

/// Runs curation stages with one configuration and text extractor.
#[derive(Debug, Clone)]
pub struct CurationPipeline {
    config: CurationConfig,
    extractor: TextFeatureExtractor,
}

impl CurationPipeline {
    pub fn new(config: CurationConfig) -> Self {
        let extractor = TextFeatureExtractor::new(config.max_keywords);
        Self { config, extractor }
    }

    /// Replaces the text extractor, e.g. with one backed by a noun tagger.
    pub fn with_extractor(mut self, extractor: TextFeatureExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &CurationConfig {
        &self.config
    }

    pub fn extractor(&self) -> &TextFeatureExtractor {
        &self.extractor
    }

    pub fn quality_scorer(&self) -> QualityScorer {
        QualityScorer::new(self.config.min_total_tokens, self.config.min_application_areas)
            .with_inspector(CaptionInspector::new(
                self.config.caption_min_chars,
                self.config.caption_max_chars,
            ))
    }

    /// Scores every record and writes the flags back onto it.
    ///
    /// Reports come back in record order whether or not scoring ran in
    /// parallel.
    pub fn score(&self, records: &mut [Record]) -> Vec<QualityReport> {
        let scorer = self.quality_scorer();
        let reports: Vec<QualityReport> = if self.config.parallel {
            records.par_iter().map(|r| scorer.score(r)).collect()
        } else {
            records.iter().map(|r| scorer.score(r)).collect()
        };

        for (record, report) in records.iter_mut().zip(&reports) {
            record.flags.has_structured_reasoning = report.has_structured_reasoning;
            record.flags.quality_pass = report.pass;
        }

        let passed = reports.iter().filter(|r| r.pass).count();
        info!(
            records = reports.len(),
            passed,
            parallel = self.config.parallel,
            "Scored annotation quality"
        );
        reports
    }

    pub fn statistics(&self, records: &[Record]) -> CorpusStatistics {
        CorpusStatistics::compute(records, &self.extractor)
    }

    pub fn mine(&self, records: &[Record]) -> PatternReport {
        PatternMiner::new(self.config.mining.clone())
            .with_seed(self.config.seed)
            .mine(records, &self.extractor)
    }

    pub fn cluster(&self, records: &[Record]) -> ClusterReport {
        DiversityClusterer::new(self.config.clustering.clone())
            .with_themes(self.config.themes.clone())
            .with_seed(self.config.seed)
            .cluster(records, &self.extractor)
    }

    /// Samples with the configured strategy.
    ///
    /// The cluster strategy reuses `clusters` when given and clusters the
    /// corpus itself otherwise.
    pub fn sample(&self, records: &[Record], clusters: Option<&ClusterReport>) -> SampleOutcome {
        let sampler = QuotaSampler::new().with_seed(self.config.seed);
        match self.config.strategy {
            SamplingStrategy::Cluster => match clusters {
                Some(report) => {
                    sampler.cluster_stratified(&report.labels, report.k, self.config.target_size)
                }
                None => {
                    let report = self.cluster(records);
                    sampler.cluster_stratified(&report.labels, report.k, self.config.target_size)
                }
            },
            SamplingStrategy::Category => {
                let scorer = HeuristicScorer::new(self.config.sample_weights.clone());
                let scores: Vec<f64> = if self.config.parallel {
                    records.par_iter().map(|r| scorer.score(r)).collect()
                } else {
                    records.iter().map(|r| scorer.score(r)).collect()
                };
                sampler.category_quota_scored(
                    records,
                    &self.config.categories,
                    &scores,
                    self.config.target_size,
                )
            }
        }
    }

    /// Runs every stage over a loaded corpus.
    pub fn run(&self, corpus: LoadedCorpus) -> CurationOutcome {
        let start = Instant::now();
        let LoadedCorpus {
            mut records,
            stats: load_stats,
        } = corpus;

        info!(
            records = records.len(),
            skipped = load_stats.skipped(),
            noun_mode = self.extractor.noun_mode(),
            "Starting curation"
        );
        if records.is_empty() {
            warn!("Corpus is empty, every report will be empty");
        }

        let quality = self.score(&mut records);
        let statistics = self.statistics(&records);
        debug!(summary = %statistics.summary(), "Computed corpus statistics");
        let patterns = self.mine(&records);
        let clusters = self.cluster(&records);
        let sample = self.sample(&records, Some(&clusters));

        let quality_passed = quality.iter().filter(|r| r.pass).count();
        let summary = CurationSummary {
            total_records: records.len(),
            skipped_on_load: load_stats.skipped(),
            quality_passed,
            quality_pass_rate: if records.is_empty() {
                0.0
            } else {
                quality_passed as f64 / records.len() as f64
            },
            structured_records: quality.iter().filter(|r| r.has_structured_reasoning).count(),
            clusters: clusters.k,
            rules_found: patterns.total_rules,
            strategy: self.config.strategy,
            target_size: self.config.target_size,
            curated_records: sample.len(),
            shortfall: sample.shortfall,
            seed: self.config.seed,
            noun_mode: self.extractor.noun_mode().to_string(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            curated = summary.curated_records,
            target = summary.target_size,
            passed = summary.quality_passed,
            elapsed_ms = summary.elapsed_ms,
            "Curation finished"
        );

        CurationOutcome {
            records,
            load_stats,
            quality,
            statistics,
            patterns,
            clusters,
            sample,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Caption, CaptionEntry, MediaKind};

    fn structured(id: usize, topic: &str) -> Record {
        let application: Vec<CaptionEntry> = (1..=5)
            .map(|n| CaptionEntry::with_tokens(format!("{n}. {topic} 활용 분야 설명"), 6))
            .collect();
        let caption = Caption::segmented(
            vec![CaptionEntry::with_tokens(format!("{topic} 장면의 객체"), 20)],
            vec![CaptionEntry::with_tokens(format!("{topic} 장면의 의미"), 20)],
            application,
        );
        Record::new(id.to_string(), MediaKind::Video, caption)
    }

    fn corpus() -> Vec<Record> {
        (0..40)
            .map(|i| {
                if i % 4 == 0 {
                    Record::new(i.to_string(), MediaKind::Image, Caption::flat("짧은 설명"))
                } else if i % 2 == 0 {
                    structured(i, "도시 건물")
                } else {
                    structured(i, "바다 해변")
                }
            })
            .collect()
    }

    fn small_config() -> CurationConfig {
        let mut config = CurationConfig::default().with_target_size(12).with_n_clusters(3);
        config.clustering.min_df = 2;
        config
    }

    #[test]
    fn test_score_writes_flags_back() {
        let mut records = corpus();
        let pipeline = CurationPipeline::new(small_config());
        let reports = pipeline.score(&mut records);

        assert_eq!(reports.len(), 40);
        for (record, report) in records.iter().zip(&reports) {
            assert_eq!(record.id, report.id);
            assert_eq!(record.flags.quality_pass, report.pass);
        }
        assert!(records[1].flags.quality_pass);
        assert!(!records[0].flags.quality_pass);
        assert!(!records[0].flags.has_structured_reasoning);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let mut a = corpus();
        let mut b = corpus();
        let parallel = CurationPipeline::new(small_config()).score(&mut a);
        let sequential = CurationPipeline::new(small_config().with_parallel(false)).score(&mut b);
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_full_run() {
        let corpus = LoadedCorpus {
            records: corpus(),
            stats: LoadStats::default(),
        };
        let outcome = CurationPipeline::new(small_config()).run(corpus);

        assert_eq!(outcome.summary.total_records, 40);
        assert_eq!(outcome.summary.quality_passed, 30);
        assert!((outcome.summary.quality_pass_rate - 0.75).abs() < 1e-12);
        assert_eq!(outcome.summary.curated_records, 12);
        assert_eq!(outcome.summary.shortfall, 0);
        assert_eq!(outcome.curated_records().len(), 12);
        assert_eq!(outcome.clusters.labels.len(), 40);
    }

    #[test]
    fn test_category_strategy() {
        let config = small_config().with_strategy(SamplingStrategy::Category);
        let records = corpus();
        let outcome = CurationPipeline::new(config).sample(&records, None);

        assert_eq!(outcome.strategy, SamplingStrategy::Category);
        assert_eq!(outcome.len(), 12);
    }

    #[test]
    fn test_empty_run() {
        let outcome = CurationPipeline::new(small_config()).run(LoadedCorpus::default());
        assert_eq!(outcome.summary.total_records, 0);
        assert_eq!(outcome.summary.curated_records, 0);
        assert_eq!(outcome.summary.shortfall, 12);
        assert_eq!(outcome.summary.quality_pass_rate, 0.0);
    }
}
