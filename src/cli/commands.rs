//! CLI command definitions for corpus-forge.
//!
//! Every command loads a corpus the same way (`--records` or
//! `--annotations`), builds one configuration from file, environment and
//! flags, runs its stages, prints a summary (or JSON with `--json`) and writes
//! its artifacts when `--output` is given. `curate` always writes.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use crate::diversity::SamplingStrategy;
use crate::error::LoadError;
use crate::export::reports::STATISTICS_JSON;
use crate::export::{read_parquet, CuratedRow, CurationExporter, SamplingDocument};
use crate::pipeline::{CurationConfig, CurationPipeline};
use crate::record::{CorpusLoader, LoadStats, LoadedCorpus};
use crate::statistics::CorpusStatistics;
use crate::text::{LexiconTagger, TextFeatureExtractor};

/// Default output directory of `curate`.
const DEFAULT_OUTPUT_DIR: &str = "./curated-output";

/// Caption corpus curation: quality, statistics, patterns, clusters, sampling.
#[derive(Parser)]
#[command(name = "corpus-forge")]
#[command(about = "Curate an annotated image/video caption corpus into a balanced training subset")]
#[command(version)]
#[command(
    long_about = "corpus-forge scores caption quality, measures corpus health, mines keyword patterns,\nclusters captions by topic and draws a quota-balanced subset.\n\nExample usage:\n  corpus-forge curate --annotations ./labels --target-size 50000 --output ./curated-output"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Score annotation quality and compute corpus statistics.
    Analyze(AnalyzeArgs),

    /// Mine keyword association rules and the co-occurrence network.
    Mine(MineArgs),

    /// Cluster captions into labeled topics.
    Cluster(ClusterArgs),

    /// Draw a quota-balanced subset.
    Sample(SampleArgs),

    /// Run every stage and write all artifacts.
    Curate(CurateArgs),
}

/// Input and output flags shared by every command.
#[derive(clap::Args, Debug, Clone)]
pub struct InputArgs {
    /// JSONL record file, or a curated Parquet file.
    #[arg(short = 'r', long, conflicts_with = "annotations")]
    pub records: Option<PathBuf>,

    /// Directory of raw annotation JSON files, searched recursively.
    #[arg(short = 'a', long)]
    pub annotations: Option<PathBuf>,

    /// Skip annotations whose media file is missing.
    #[arg(long)]
    pub require_media: bool,

    /// YAML configuration file.
    #[arg(short = 'c', long, env = "CURATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Tab-separated noun lexicon enabling noun-based keyword extraction.
    #[arg(long)]
    pub noun_lexicon: Option<PathBuf>,

    /// Seed for every randomized stage.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output directory for artifacts.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Output results as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Sampling strategy flag.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyArg {
    Cluster,
    Category,
}

impl From<StrategyArg> for SamplingStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Cluster => SamplingStrategy::Cluster,
            StrategyArg::Category => SamplingStrategy::Category,
        }
    }
}

/// Arguments for `corpus-forge analyze`.
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Minimum total tokens for a record to pass.
    #[arg(long)]
    pub min_total_tokens: Option<u32>,

    /// Minimum application areas for a record to pass.
    #[arg(long)]
    pub min_application_areas: Option<usize>,
}

/// Arguments for `corpus-forge mine`.
#[derive(Parser, Debug)]
pub struct MineArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Minimum itemset support.
    #[arg(long)]
    pub min_support: Option<f64>,

    /// Minimum rule confidence.
    #[arg(long)]
    pub min_confidence: Option<f64>,

    /// Rules kept in the report.
    #[arg(long)]
    pub top_rules: Option<usize>,
}

/// Arguments for `corpus-forge cluster`.
#[derive(Parser, Debug)]
pub struct ClusterArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Number of clusters.
    #[arg(short = 'k', long)]
    pub clusters: Option<usize>,
}

/// Arguments for `corpus-forge sample`.
#[derive(Parser, Debug)]
pub struct SampleArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Sampling strategy.
    #[arg(short = 's', long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Number of records to select.
    #[arg(short = 'n', long)]
    pub target_size: Option<usize>,

    /// Number of clusters for the cluster strategy.
    #[arg(short = 'k', long)]
    pub clusters: Option<usize>,
}

/// Arguments for `corpus-forge curate`.
#[derive(Parser, Debug)]
pub struct CurateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Sampling strategy.
    #[arg(short = 's', long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Number of records to select.
    #[arg(short = 'n', long)]
    pub target_size: Option<usize>,

    /// Number of clusters.
    #[arg(short = 'k', long)]
    pub clusters: Option<usize>,
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
///
/// For control over logging initialization, use `parse_cli()` and
/// `run_with_cli()`.
pub fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli())
}

/// Run the CLI with the parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Analyze(args) => run_analyze_command(args),
        Commands::Mine(args) => run_mine_command(args),
        Commands::Cluster(args) => run_cluster_command(args),
        Commands::Sample(args) => run_sample_command(args),
        Commands::Curate(args) => run_curate_command(args),
    }
}

// ============================================================================
// Shared setup
// ============================================================================

/// Defaults, then the YAML file, then `CURATE_*` variables, then `overrides`.
fn build_config(
    input: &InputArgs,
    overrides: impl FnOnce(&mut CurationConfig),
) -> anyhow::Result<CurationConfig> {
    let mut config = match &input.config {
        Some(path) => CurationConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => CurationConfig::default(),
    };
    config.apply_env()?;
    if let Some(seed) = input.seed {
        config.seed = seed;
    }
    overrides(&mut config);
    config.validate()?;
    Ok(config)
}

fn build_pipeline(input: &InputArgs, config: CurationConfig) -> anyhow::Result<CurationPipeline> {
    let extractor = match &input.noun_lexicon {
        Some(path) => {
            let tagger = LexiconTagger::load(path)
                .with_context(|| format!("Failed to read noun lexicon {}", path.display()))?;
            TextFeatureExtractor::with_tagger(config.max_keywords, tagger)
        }
        None => TextFeatureExtractor::new(config.max_keywords),
    };
    info!(noun_mode = extractor.noun_mode(), "Text extractor ready");
    Ok(CurationPipeline::new(config).with_extractor(extractor))
}

fn is_parquet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("parquet"))
        .unwrap_or(false)
}

fn load_corpus(input: &InputArgs) -> anyhow::Result<LoadedCorpus> {
    let loader = CorpusLoader::new().with_require_media(input.require_media);
    let corpus = match (&input.records, &input.annotations) {
        (Some(path), _) if is_parquet(path) => {
            let records = read_parquet(path)?;
            LoadedCorpus {
                stats: LoadStats {
                    loaded: records.len(),
                    ..Default::default()
                },
                records,
            }
        }
        (Some(path), _) => loader.load_jsonl(path)?,
        (None, Some(dir)) => loader.load_annotation_dir(dir)?,
        (None, None) => return Err(LoadError::NoInput.into()),
    };

    if corpus.stats.skipped() > 0 {
        warn!(
            skipped = corpus.stats.skipped(),
            invalid_json = corpus.stats.invalid_json,
            missing_caption = corpus.stats.missing_caption,
            missing_media = corpus.stats.missing_media,
            duplicate_id = corpus.stats.duplicate_id,
            "Skipped inputs while loading"
        );
    }
    Ok(corpus)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

fn run_analyze_command(args: AnalyzeArgs) -> anyhow::Result<()> {
    let config = build_config(&args.input, |c| {
        if let Some(v) = args.min_total_tokens {
            c.min_total_tokens = v;
        }
        if let Some(v) = args.min_application_areas {
            c.min_application_areas = v;
        }
    })?;
    let pipeline = build_pipeline(&args.input, config)?;
    let LoadedCorpus { mut records, stats } = load_corpus(&args.input)?;

    let quality = pipeline.score(&mut records);
    let statistics = pipeline.statistics(&records);
    let passed = quality.iter().filter(|r| r.pass).count();

    if let Some(dir) = &args.input.output {
        let exporter = CurationExporter::new(dir, &records);
        exporter.write_quality(&quality)?;
        exporter.write_report(STATISTICS_JSON, &statistics)?;
        info!(output = %dir.display(), "Analysis written");
    }

    if args.input.json {
        #[derive(Serialize)]
        struct AnalyzeOutput<'a> {
            load: &'a LoadStats,
            quality_passed: usize,
            quality_failed: usize,
            statistics: &'a CorpusStatistics,
        }
        return print_json(&AnalyzeOutput {
            load: &stats,
            quality_passed: passed,
            quality_failed: quality.len() - passed,
            statistics: &statistics,
        });
    }

    println!("\n=== Corpus Analysis ===");
    println!("Loaded:          {}", stats.loaded);
    println!("Skipped:         {}", stats.skipped());
    println!("Quality passed:  {} / {}", passed, quality.len());
    println!();
    println!("{}", statistics.summary());
    Ok(())
}

fn run_mine_command(args: MineArgs) -> anyhow::Result<()> {
    let config = build_config(&args.input, |c| {
        if let Some(v) = args.min_support {
            c.mining.min_support = v;
        }
        if let Some(v) = args.min_confidence {
            c.mining.min_confidence = v;
        }
        if let Some(v) = args.top_rules {
            c.mining.top_rules = v;
        }
    })?;
    let pipeline = build_pipeline(&args.input, config)?;
    let corpus = load_corpus(&args.input)?;
    let report = pipeline.mine(&corpus.records);

    if let Some(dir) = &args.input.output {
        let exporter = CurationExporter::new(dir, &corpus.records);
        exporter.write_rules(&report)?;
        exporter.write_network(&report)?;
    }

    if args.input.json {
        return print_json(&report);
    }

    println!("\n=== Keyword Patterns ===");
    println!("Records mined:     {}", report.records_mined);
    println!("Frequent itemsets: {}", report.frequent_itemsets);
    println!("Rules found:       {}", report.total_rules);
    println!();
    for rule in report.rules.iter().take(10) {
        println!(
            "  {{{}}} -> {{{}}}  support {:.3}  confidence {:.3}  lift {:.2}",
            rule.antecedent.join(", "),
            rule.consequent.join(", "),
            rule.support,
            rule.confidence,
            rule.lift
        );
    }
    if !report.network.edges.is_empty() {
        println!("\nStrongest co-occurrences:");
        for edge in report.network.edges.iter().take(10) {
            println!("  {} - {}  ({})", edge.source, edge.target, edge.weight);
        }
    }
    Ok(())
}

fn run_cluster_command(args: ClusterArgs) -> anyhow::Result<()> {
    let config = build_config(&args.input, |c| {
        if let Some(k) = args.clusters {
            c.clustering.n_clusters = k;
        }
    })?;
    let pipeline = build_pipeline(&args.input, config)?;
    let corpus = load_corpus(&args.input)?;
    let report = pipeline.cluster(&corpus.records);

    if let Some(dir) = &args.input.output {
        CurationExporter::new(dir, &corpus.records).write_clusters(&report)?;
    }

    if args.input.json {
        return print_json(&report.clusters);
    }

    println!("\n=== Topic Clusters ===");
    println!(
        "Clusters: {}  (vocabulary {}, inertia {:.2})",
        report.k,
        report.vocabulary.len(),
        report.inertia
    );
    println!();
    for cluster in &report.clusters {
        println!(
            "  #{:<3} {:>7} ({:>5.1}%)  [{}]  {}",
            cluster.id, cluster.size, cluster.percentage, cluster.theme, cluster.description
        );
    }
    Ok(())
}

fn run_sample_command(args: SampleArgs) -> anyhow::Result<()> {
    let config = build_config(&args.input, |c| {
        if let Some(s) = args.strategy {
            c.strategy = s.into();
        }
        if let Some(n) = args.target_size {
            c.target_size = n;
        }
        if let Some(k) = args.clusters {
            c.clustering.n_clusters = k;
        }
    })?;
    let pipeline = build_pipeline(&args.input, config)?;
    let corpus = load_corpus(&args.input)?;

    let clusters = match pipeline.config().strategy {
        SamplingStrategy::Cluster => Some(pipeline.cluster(&corpus.records)),
        SamplingStrategy::Category => None,
    };
    let outcome = pipeline.sample(&corpus.records, clusters.as_ref());

    if let Some(dir) = &args.input.output {
        let exporter = CurationExporter::new(dir, &corpus.records);
        let labels = clusters.as_ref().map(|c| c.labels.as_slice());
        let rows: Vec<_> = outcome
            .indices
            .iter()
            .map(|&i| CuratedRow {
                record: &corpus.records[i],
                cluster: labels.and_then(|l| l.get(i).copied()),
            })
            .collect();
        exporter.write_curated(&rows)?;
        exporter.write_sampling(&outcome, &corpus.records)?;
    }

    let document = SamplingDocument::new(&outcome, &corpus.records);
    if args.input.json {
        return print_json(&document);
    }

    println!("\n=== Sampling ({}) ===", document.strategy);
    println!("Target:    {}", document.target);
    println!("Selected:  {}", document.selected);
    println!("Quota:     {} per group", document.quota_per_group);
    println!("Fill:      {}", document.fill_count);
    println!("Shortfall: {}", document.shortfall);
    println!();
    for group in &document.groups {
        println!(
            "  {:<24} {:>7} of {:>7}",
            group.group, group.selected, group.available
        );
    }
    Ok(())
}

fn run_curate_command(args: CurateArgs) -> anyhow::Result<()> {
    let config = build_config(&args.input, |c| {
        if let Some(s) = args.strategy {
            c.strategy = s.into();
        }
        if let Some(n) = args.target_size {
            c.target_size = n;
        }
        if let Some(k) = args.clusters {
            c.clustering.n_clusters = k;
        }
    })?;
    let pipeline = build_pipeline(&args.input, config)?;
    let corpus = load_corpus(&args.input)?;
    let outcome = pipeline.run(corpus);

    let output = args
        .input
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let result = CurationExporter::new(&output, &outcome.records).export(&outcome)?;

    if args.input.json {
        return print_json(&outcome.summary);
    }

    let s = &outcome.summary;
    println!("\n=== Curation Complete ===");
    println!("Records:         {} ({} skipped on load)", s.total_records, s.skipped_on_load);
    println!("Quality passed:  {} ({:.1}%)", s.quality_passed, s.quality_pass_rate * 100.0);
    println!("Clusters:        {}", s.clusters);
    println!("Rules found:     {}", s.rules_found);
    println!("Strategy:        {}", s.strategy);
    println!("Curated:         {} / {}", s.curated_records, s.target_size);
    if s.shortfall > 0 {
        println!("Shortfall:       {}", s.shortfall);
    }
    println!("Output:          {}", result.output_dir.display());
    println!("Fingerprint:     {}", result.corpus_fingerprint);
    Ok(())
}
