//! Corpus-level statistical health.
//!
//! Provides lexical diversity, class imbalance, duration/caption-length
//! correlation and exact-duplicate detection. Degenerate input (an empty
//! corpus, no videos, one class) yields zero or empty results, never errors.

mod correlation;
mod duplicates;
mod imbalance;
mod lexical;

pub use correlation::{pearson, Direction, DurationCaptionCorrelation, Strength};
pub use duplicates::{DuplicateGroup, DuplicateReport, DUPLICATE_PREFIX_CHARS};
pub use imbalance::{
    gini_coefficient, imbalance_ratio, normalized_entropy, shannon_entropy, ClassImbalance,
};
pub use lexical::{type_token_ratio, LexicalDiversity, SegmentDiversity, Summary, WordCount};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::record::Record;
use crate::text::TextFeatureExtractor;

/// Every corpus statistic in one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusStatistics {
    pub records: usize,
    pub lexical: LexicalDiversity,
    pub segments: Vec<SegmentDiversity>,
    pub media_kind: ClassImbalance,
    pub category: ClassImbalance,
    pub duration_caption: DurationCaptionCorrelation,
    pub duplicates: DuplicateReport,
}

impl CorpusStatistics {
    pub fn compute(records: &[Record], extractor: &TextFeatureExtractor) -> Self {
        let stats = Self {
            records: records.len(),
            lexical: LexicalDiversity::compute(records, extractor),
            segments: SegmentDiversity::compute_all(records, extractor),
            media_kind: ClassImbalance::from_labels(records.iter().map(|r| r.media_kind.as_str())),
            category: ClassImbalance::from_labels(records.iter().map(|r| r.category.as_str())),
            duration_caption: DurationCaptionCorrelation::compute(records),
            duplicates: DuplicateReport::compute(records),
        };

        info!(
            records = stats.records,
            record_ttr = stats.lexical.record_ttr.mean,
            global_ttr = stats.lexical.global_ttr,
            category_gini = stats.category.gini,
            duplicate_groups = stats.duplicates.groups.len(),
            "Computed corpus statistics"
        );
        stats
    }

    pub fn summary(&self) -> String {
        format!(
            "Corpus Statistics:\n\
             - Records: {}\n\
             - Record TTR (mean/min/max): {:.4} / {:.4} / {:.4}\n\
             - Global TTR: {:.4} ({} types / {} tokens)\n\
             - Words per caption (mean): {:.1}\n\
             - Media kinds: {} (ratio {:.2}:1)\n\
             - Categories: {} (ratio {:.2}:1, gini {:.4})\n\
             - Duration/caption r: {:.4} ({:?}, {:?})\n\
             - Duplicate caption groups: {}",
            self.records,
            self.lexical.record_ttr.mean,
            self.lexical.record_ttr.min,
            self.lexical.record_ttr.max,
            self.lexical.global_ttr,
            self.lexical.unique_types,
            self.lexical.total_tokens,
            self.lexical.words_per_caption.mean,
            self.media_kind.class_count(),
            self.media_kind.imbalance_ratio,
            self.category.class_count(),
            self.category.imbalance_ratio,
            self.category.gini,
            self.duration_caption.pearson_r,
            self.duration_caption.strength,
            self.duration_caption.direction,
            self.duplicates.groups.len(),
        )
    }
}
