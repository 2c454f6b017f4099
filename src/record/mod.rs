//! Record model and corpus loading.
//!
//! A [`Record`] is one annotated image or video with a hierarchical caption.
//! Records come either from a JSONL file of already normalized records or
//! from a tree of raw labeling-tool annotations.

pub mod annotation;
pub mod loader;
pub mod types;

pub use annotation::RawAnnotation;
pub use loader::{CorpusLoader, LoadStats, LoadedCorpus};
pub use types::{
    parse_duration, parse_resolution, Caption, CaptionEntry, CaptionLevel, MediaKind,
    QualityFlags, Record,
};
