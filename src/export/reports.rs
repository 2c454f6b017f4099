//! JSON and JSONL artifacts of a curation run.
//!
//! Every JSON report is wrapped in an envelope carrying the generation time
//! and a fingerprint of the corpus it was computed from, so reports from
//! different snapshots are never mixed up.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::parquet_writer::{write_parquet, CuratedRow};
use crate::diversity::{
    ClusterReport, ClusterSummary, GroupContribution, SampleOutcome, SamplingStrategy,
};
use crate::error::ExportError;
use crate::patterns::{AssociationRule, PatternReport};
use crate::pipeline::CurationOutcome;
use crate::quality::QualityReport;
use crate::record::Record;

pub const CURATED_JSONL: &str = "curated_records.jsonl";
pub const CURATED_PARQUET: &str = "curated_records.parquet";
pub const QUALITY_JSONL: &str = "quality_report.jsonl";
pub const STATISTICS_JSON: &str = "corpus_statistics.json";
pub const RULES_JSON: &str = "association_rules.json";
pub const NETWORK_JSON: &str = "keyword_network.json";
pub const CLUSTERS_JSON: &str = "clusters.json";
pub const SAMPLING_JSON: &str = "sampling_result.json";
pub const SUMMARY_JSON: &str = "curation_summary.json";

/// Hex SHA-256 over the sorted record ids, one per line.
pub fn corpus_fingerprint<'a>(ids: impl IntoIterator<Item = &'a str>) -> String {
    let mut ids: Vec<&str> = ids.into_iter().collect();
    ids.sort_unstable();

    let mut hasher = Sha256::new();
    for id in ids {
        hasher.update(id.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

/// Wrapper written around every JSON report.
#[derive(Debug, Serialize)]
pub struct ReportEnvelope<'a, T: Serialize> {
    pub generated_at: DateTime<Utc>,
    pub corpus_fingerprint: &'a str,
    pub corpus_records: usize,
    pub report: &'a T,
}

/// Rules section of the mining report.
#[derive(Debug, Serialize)]
struct RulesDocument<'a> {
    records_mined: usize,
    total_transactions: usize,
    vocabulary: &'a [String],
    frequent_itemsets: usize,
    total_rules: usize,
    rules: &'a [AssociationRule],
}

impl<'a> From<&'a PatternReport> for RulesDocument<'a> {
    fn from(report: &'a PatternReport) -> Self {
        Self {
            records_mined: report.records_mined,
            total_transactions: report.total_transactions,
            vocabulary: &report.vocabulary,
            frequent_itemsets: report.frequent_itemsets,
            total_rules: report.total_rules,
            rules: &report.rules,
        }
    }
}

/// Cluster summaries without the per-record labels.
#[derive(Debug, Serialize)]
struct ClustersDocument<'a> {
    k: usize,
    inertia: f64,
    vocabulary: &'a [String],
    clusters: &'a [ClusterSummary],
}

impl<'a> From<&'a ClusterReport> for ClustersDocument<'a> {
    fn from(report: &'a ClusterReport) -> Self {
        Self {
            k: report.k,
            inertia: report.inertia,
            vocabulary: &report.vocabulary,
            clusters: &report.clusters,
        }
    }
}

/// How the curated subset was drawn, with the selected ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingDocument {
    pub strategy: SamplingStrategy,
    pub target: usize,
    pub selected: usize,
    pub quota_per_group: usize,
    pub fill_count: usize,
    pub shortfall: usize,
    pub groups: Vec<GroupContribution>,
    pub ids: Vec<String>,
}

impl SamplingDocument {
    pub fn new(outcome: &SampleOutcome, records: &[Record]) -> Self {
        Self {
            strategy: outcome.strategy,
            target: outcome.target,
            selected: outcome.len(),
            quota_per_group: outcome.quota_per_group,
            fill_count: outcome.fill_count,
            shortfall: outcome.shortfall,
            groups: outcome.groups.clone(),
            ids: outcome
                .indices
                .iter()
                .filter_map(|&i| records.get(i))
                .map(|r| r.id.clone())
                .collect(),
        }
    }
}

/// One curated JSONL line: the record plus its cluster.
#[derive(Serialize)]
struct CuratedLine<'a> {
    #[serde(flatten)]
    record: &'a Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    cluster: Option<usize>,
}

/// Paths written by a full export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub output_dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub curated_records: usize,
    pub corpus_fingerprint: String,
    pub exported_at: DateTime<Utc>,
}

/// Writes curation artifacts into one output directory.
#[derive(Debug, Clone)]
pub struct CurationExporter {
    output_dir: PathBuf,
    fingerprint: String,
    corpus_records: usize,
    generated_at: DateTime<Utc>,
}

impl CurationExporter {
    /// Creates an exporter for reports about `records`.
    pub fn new(output_dir: impl Into<PathBuf>, records: &[Record]) -> Self {
        Self {
            output_dir: output_dir.into(),
            fingerprint: corpus_fingerprint(records.iter().map(|r| r.id.as_str())),
            corpus_records: records.len(),
            generated_at: Utc::now(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Writes one enveloped, pretty-printed JSON report.
    pub fn write_report<T: Serialize>(
        &self,
        file_name: &str,
        report: &T,
    ) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(file_name);

        let envelope = ReportEnvelope {
            generated_at: self.generated_at,
            corpus_fingerprint: &self.fingerprint,
            corpus_records: self.corpus_records,
            report,
        };
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, &envelope)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        tracing::debug!(path = %path.display(), "Report written");
        Ok(path)
    }

    /// Writes items as JSON lines.
    pub fn write_jsonl<T: Serialize>(
        &self,
        file_name: &str,
        items: impl IntoIterator<Item = T>,
    ) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(file_name);
        let mut writer = BufWriter::new(File::create(&path)?);

        let mut lines = 0usize;
        for item in items {
            let json_line = serde_json::to_string(&item)?;
            writeln!(writer, "{}", json_line)?;
            lines += 1;
        }

        writer.flush()?;
        tracing::debug!(path = %path.display(), lines, "JSONL written");
        Ok(path)
    }

    pub fn write_quality(&self, reports: &[QualityReport]) -> Result<PathBuf, ExportError> {
        self.write_jsonl(QUALITY_JSONL, reports)
    }

    /// Writes curated rows as JSONL and, when non-empty, Parquet.
    pub fn write_curated(&self, rows: &[CuratedRow<'_>]) -> Result<Vec<PathBuf>, ExportError> {
        let lines = rows.iter().map(|row| CuratedLine {
            record: row.record,
            cluster: row.cluster,
        });
        let mut files = vec![self.write_jsonl(CURATED_JSONL, lines)?];

        if rows.is_empty() {
            tracing::warn!("No curated records, skipping Parquet output");
        } else {
            let path = self.output_dir.join(CURATED_PARQUET);
            write_parquet(rows, &path)?;
            files.push(path);
        }
        Ok(files)
    }

    pub fn write_rules(&self, patterns: &PatternReport) -> Result<PathBuf, ExportError> {
        self.write_report(RULES_JSON, &RulesDocument::from(patterns))
    }

    pub fn write_network(&self, patterns: &PatternReport) -> Result<PathBuf, ExportError> {
        self.write_report(NETWORK_JSON, &patterns.network)
    }

    pub fn write_clusters(&self, clusters: &ClusterReport) -> Result<PathBuf, ExportError> {
        self.write_report(CLUSTERS_JSON, &ClustersDocument::from(clusters))
    }

    pub fn write_sampling(
        &self,
        outcome: &SampleOutcome,
        records: &[Record],
    ) -> Result<PathBuf, ExportError> {
        self.write_report(SAMPLING_JSON, &SamplingDocument::new(outcome, records))
    }

    /// Writes every artifact of a full run.
    pub fn export(&self, outcome: &CurationOutcome) -> Result<ExportResult, ExportError> {
        let labels = &outcome.clusters.labels;
        let rows: Vec<CuratedRow<'_>> = outcome
            .sample
            .indices
            .iter()
            .map(|&i| CuratedRow {
                record: &outcome.records[i],
                cluster: labels.get(i).copied(),
            })
            .collect();

        let mut files = self.write_curated(&rows)?;
        files.push(self.write_quality(&outcome.quality)?);
        files.push(self.write_report(STATISTICS_JSON, &outcome.statistics)?);
        files.push(self.write_rules(&outcome.patterns)?);
        files.push(self.write_network(&outcome.patterns)?);
        files.push(self.write_clusters(&outcome.clusters)?);
        files.push(self.write_sampling(&outcome.sample, &outcome.records)?);
        files.push(self.write_report(SUMMARY_JSON, &outcome.summary)?);

        tracing::info!(
            output_dir = %self.output_dir.display(),
            files = files.len(),
            curated = rows.len(),
            fingerprint = %self.fingerprint,
            "Exported curation artifacts"
        );

        Ok(ExportResult {
            output_dir: self.output_dir.clone(),
            files,
            curated_records: rows.len(),
            corpus_fingerprint: self.fingerprint.clone(),
            exported_at: self.generated_at,
        })
    }
}
