//! End-to-end tests of corpus loading, curation and artifact export.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use corpus_forge::categories::{KeywordRule, RuleSet};
use corpus_forge::diversity::{QuotaSampler, SamplingStrategy};
use corpus_forge::export::{read_parquet, CurationExporter};
use corpus_forge::pipeline::{CurationConfig, CurationPipeline};
use corpus_forge::record::{Caption, CorpusLoader, MediaKind, Record};
use serde_json::json;

fn write_annotation(dir: &Path, name: &str, topic: &str, areas: usize) {
    let application: Vec<_> = (1..=areas)
        .map(|n| json!({ "text": format!("{n}. {topic} 관련 교육 자료로 활용"), "token": 8 }))
        .collect();
    let doc = json!({
        "source_data_info": {
            "clip_id": name,
            "ai_generated_info": { "keyword": topic, "mid_category": "풍경" }
        },
        "raw_data_info": {
            "source_media_info": {
                "resolution": "1280, 720",
                "details": { "length": "00:00:15.500" }
            }
        },
        "labeling_data_info": {
            "caption_info": {
                "object_level": [{ "text": format!("{topic} 장면이 보인다"), "token": 20 }],
                "semantic_level": [{ "text": format!("{topic} 분위기를 전달한다"), "token": 20 }],
                "application_level": application
            }
        }
    });
    fs::write(dir.join(format!("{name}.json")), doc.to_string()).unwrap();
    fs::write(dir.join(format!("{name}.mp4")), b"").unwrap();
}

fn annotation_tree(root: &Path) {
    let videos = root.join("videos");
    fs::create_dir_all(&videos).unwrap();
    for i in 0..60 {
        let topic = match i % 3 {
            0 => "도시 건물 야경",
            1 => "바다 해변 노을",
            _ => "공장 기계 작업",
        };
        // every fifth clip lists too few application areas
        let areas = if i % 5 == 0 { 2 } else { 5 };
        write_annotation(&videos, &format!("clip_{i:03}"), topic, areas);
    }
    fs::write(videos.join("broken.json"), "{ not json").unwrap();
}

#[test]
fn test_curate_annotation_tree() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    annotation_tree(input.path());

    let corpus = CorpusLoader::new()
        .with_require_media(true)
        .load_annotation_dir(input.path())
        .unwrap();
    assert_eq!(corpus.records.len(), 60);
    assert_eq!(corpus.stats.invalid_json, 1);
    assert!(corpus.records.iter().all(|r| r.media_kind == MediaKind::Video));
    assert!((corpus.records[0].duration_secs - 15.5).abs() < 1e-9);

    let mut config = CurationConfig::default().with_target_size(30).with_n_clusters(3);
    config.clustering.min_df = 2;
    let outcome = CurationPipeline::new(config).run(corpus);

    assert_eq!(outcome.summary.total_records, 60);
    assert_eq!(outcome.summary.quality_passed, 48);
    assert_eq!(outcome.summary.curated_records, 30);
    assert_eq!(outcome.summary.clusters, 3);

    let curated = outcome.curated_records();
    let ids: HashSet<&str> = curated.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), 30);

    let result = CurationExporter::new(output.path(), &outcome.records)
        .export(&outcome)
        .unwrap();
    assert_eq!(result.curated_records, 30);

    let from_parquet = read_parquet(&output.path().join("curated_records.parquet")).unwrap();
    assert_eq!(from_parquet.len(), 30);
    for record in &from_parquet {
        let original = outcome.records.iter().find(|r| r.id == record.id).unwrap();
        assert_eq!(record, original);
    }

    let summary: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(output.path().join("curation_summary.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(summary["report"]["curated_records"], 30);
    assert_eq!(summary["corpus_fingerprint"], result.corpus_fingerprint.as_str());

    let clusters: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output.path().join("clusters.json")).unwrap())
            .unwrap();
    assert_eq!(clusters["report"]["clusters"].as_array().unwrap().len(), 3);
}

#[test]
fn test_same_seed_same_subset() {
    let input = tempfile::tempdir().unwrap();
    annotation_tree(input.path());

    let run = || {
        let corpus = CorpusLoader::new().load_annotation_dir(input.path()).unwrap();
        let mut config = CurationConfig::default().with_target_size(20).with_n_clusters(3);
        config.clustering.min_df = 2;
        CurationPipeline::new(config).run(corpus).sample.indices
    };
    assert_eq!(run(), run());
}

#[test]
fn test_jsonl_input_with_bad_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.jsonl");
    let lines = [
        r#"{"id": "a", "media_kind": "image", "caption": "한강 다리 야경"}"#,
        "not json at all",
        r#"{"id": "b", "media_kind": "video", "caption": "산 정상 풍경", "duration_secs": 12.0}"#,
        r#"{"id": "a", "media_kind": "image", "caption": "duplicate id"}"#,
        "",
    ];
    fs::write(&path, lines.join("\n")).unwrap();

    let corpus = CorpusLoader::new().load_jsonl(&path).unwrap();
    assert_eq!(corpus.records.len(), 2);
    assert_eq!(corpus.stats.invalid_json, 1);
    assert_eq!(corpus.stats.duplicate_id, 1);

    let config = CurationConfig::default()
        .with_target_size(5)
        .with_strategy(SamplingStrategy::Category);
    let outcome = CurationPipeline::new(config).run(corpus);
    assert_eq!(outcome.summary.curated_records, 2);
    assert_eq!(outcome.summary.shortfall, 3);
    assert_eq!(outcome.summary.skipped_on_load, 2);
}

#[test]
fn test_category_quota_takes_top_scored_per_category() {
    let records: Vec<Record> = (0..1000)
        .map(|i| {
            let text = match i {
                0..=299 => "ocean waves",
                300..=599 => "city street",
                _ => "forest trail",
            };
            Record::new(i.to_string(), MediaKind::Image, Caption::flat(text))
        })
        .collect();
    let rules = RuleSet::new(vec![
        KeywordRule::new("sea", &["ocean"]),
        KeywordRule::new("city", &["city"]),
        KeywordRule::new("forest", &["forest"]),
    ]);
    let scores: Vec<f64> = (0..1000).map(|i| i as f64).collect();

    let outcome = QuotaSampler::new().category_quota_scored(&records, &rules, &scores, 90);

    assert_eq!(outcome.len(), 90);
    assert_eq!(outcome.quota_per_group, 30);
    assert_eq!(outcome.fill_count, 0);

    let mut picked = outcome.indices.clone();
    picked.sort_unstable();
    let expected: Vec<usize> = (270..300).chain(570..600).chain(970..1000).collect();
    assert_eq!(picked, expected);
}
