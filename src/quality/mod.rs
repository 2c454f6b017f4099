//! Annotation quality scoring.
//!
//! - [`QualityScorer`]: token and application-area thresholds per record
//! - [`CaptionInspector`]: diagnostic caption issues
//! - [`SampleScorer`]: ranking score used by quota sampling

mod issues;
mod sample;
mod scorer;

pub use issues::{CaptionInspector, CaptionIssue, CaptionIssueType, Severity};
pub use sample::{HeuristicScorer, HeuristicWeights, SampleScorer, MAX_SAMPLE_SCORE};
pub use scorer::{
    count_application_areas, token_score, QualityReport, QualityScorer, SegmentTokens,
    DEFAULT_MIN_APPLICATION_AREAS, DEFAULT_MIN_TOTAL_TOKENS,
};
