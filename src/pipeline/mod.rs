//! Curation pipeline orchestration.
//!
//! # Pipeline Flow
//!
//! 1. **Load**: records from a JSONL file or a raw annotation tree
//! 2. **Score**: per-record quality verdicts, flags written back
//! 3. **Analyze**: corpus statistics and keyword patterns
//! 4. **Cluster**: TF-IDF topics with keyword labels
//! 5. **Sample**: a quota-balanced subset of the target size
//!
//! # Example
//!
//! ```rust,ignore
//! use corpus_forge::pipeline::{CurationConfig, CurationPipeline};
//! use corpus_forge::record::CorpusLoader;
//!
//! let config = CurationConfig::new().with_target_size(10_000);
//! let corpus = CorpusLoader::new().load_jsonl(Path::new("records.jsonl"))?;
//! let outcome = CurationPipeline::new(config).run(corpus);
//! println!("{} curated", outcome.summary.curated_records);
//! ```
//!
//! # Configuration
//!
//! ```rust,ignore
//! // From a YAML file, then the environment
//! let mut config = CurationConfig::from_yaml_file(Path::new("curate.yaml"))?;
//! config.apply_env()?;
//! config.validate()?;
//! ```

pub mod config;
pub mod runner;

pub use config::{ConfigError, CurationConfig};
pub use runner::{CurationOutcome, CurationPipeline, CurationSummary};
