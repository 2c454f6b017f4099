//! corpus-forge: curation of annotated image/video caption corpora.
//!
//! This library scores per-record annotation quality, measures corpus health,
//! mines keyword co-occurrence patterns, clusters captions by topic and draws
//! a quota-balanced training subset.

// Core modules
pub mod categories;
pub mod cli;
pub mod diversity;
pub mod error;
pub mod export;
pub mod patterns;
pub mod pipeline;
pub mod quality;
pub mod record;
pub mod statistics;
pub mod text;

// Re-export commonly used types
pub use error::{ExportError, LoadError};
pub use pipeline::{ConfigError, CurationConfig, CurationOutcome, CurationPipeline};
pub use record::{CorpusLoader, Record};
