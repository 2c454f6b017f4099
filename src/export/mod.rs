//! Export of curated records and diagnostic reports.
//!
//! Curated records go to JSONL and a zstd Parquet table; every analysis lands
//! in its own enveloped JSON report.

pub mod parquet_writer;
pub mod reports;

pub use parquet_writer::{
    curated_schema, read_parquet, rows_to_record_batch, write_parquet, write_parquet_bytes,
    CuratedRow,
};
pub use reports::{corpus_fingerprint, CurationExporter, ExportResult, SamplingDocument};
