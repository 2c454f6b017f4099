//! Parquet table of curated records.
//!
//! One row per record. Segment texts are flattened into their own columns for
//! quick inspection, and the full caption is kept as JSON so the record can be
//! rebuilt exactly.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, BooleanBuilder, Float64Array, Float64Builder, StringArray,
    StringBuilder, UInt32Builder,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::ExportError;
use crate::record::{Caption, CaptionLevel, MediaKind, QualityFlags, Record};

/// A record plus the cluster it was assigned to, if clustering ran.
#[derive(Debug, Clone, Copy)]
pub struct CuratedRow<'a> {
    pub record: &'a Record,
    pub cluster: Option<usize>,
}

/// Schema of the curated records table.
pub fn curated_schema() -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("media_kind", DataType::Utf8, false),
        Field::new("file_path", DataType::Utf8, true),
        Field::new("caption", DataType::Utf8, false),
        Field::new("object_caption", DataType::Utf8, true),
        Field::new("semantic_caption", DataType::Utf8, true),
        Field::new("application_caption", DataType::Utf8, true),
        Field::new("caption_json", DataType::Utf8, false),
        Field::new("resolution", DataType::Utf8, true),
        Field::new("width", DataType::UInt32, true),
        Field::new("height", DataType::UInt32, true),
        Field::new("duration_secs", DataType::Float64, false),
        Field::new("category", DataType::Utf8, true),
        Field::new("keyword", DataType::Utf8, true),
        Field::new("has_structured_reasoning", DataType::Boolean, false),
        Field::new("quality_pass", DataType::Boolean, false),
        Field::new("cluster", DataType::UInt32, true),
    ])
}

fn append_optional(builder: &mut StringBuilder, value: &str) {
    if value.is_empty() {
        builder.append_null();
    } else {
        builder.append_value(value);
    }
}

/// Converts rows into an Arrow RecordBatch.
pub fn rows_to_record_batch(rows: &[CuratedRow<'_>]) -> Result<RecordBatch, ExportError> {
    let schema = Arc::new(curated_schema());

    let mut id = StringBuilder::new();
    let mut media_kind = StringBuilder::new();
    let mut file_path = StringBuilder::new();
    let mut caption = StringBuilder::new();
    let mut object_caption = StringBuilder::new();
    let mut semantic_caption = StringBuilder::new();
    let mut application_caption = StringBuilder::new();
    let mut caption_json = StringBuilder::new();
    let mut resolution = StringBuilder::new();
    let mut width = UInt32Builder::new();
    let mut height = UInt32Builder::new();
    let mut duration = Float64Builder::new();
    let mut category = StringBuilder::new();
    let mut keyword = StringBuilder::new();
    let mut structured = BooleanBuilder::new();
    let mut quality_pass = BooleanBuilder::new();
    let mut cluster = UInt32Builder::new();

    for row in rows {
        let record = row.record;
        id.append_value(&record.id);
        media_kind.append_value(record.media_kind.as_str());
        append_optional(&mut file_path, &record.file_path);
        caption.append_value(record.caption_text());
        append_optional(&mut object_caption, &record.caption.level_text(CaptionLevel::Object));
        append_optional(
            &mut semantic_caption,
            &record.caption.level_text(CaptionLevel::Semantic),
        );
        append_optional(
            &mut application_caption,
            &record.caption.level_text(CaptionLevel::Application),
        );
        caption_json.append_value(serde_json::to_string(&record.caption)?);
        append_optional(&mut resolution, &record.resolution);

        match record.dimensions() {
            Some((w, h)) => {
                width.append_value(w);
                height.append_value(h);
            }
            None => {
                width.append_null();
                height.append_null();
            }
        }

        duration.append_value(record.duration_secs);
        append_optional(&mut category, &record.category);
        append_optional(&mut keyword, &record.keyword);
        structured.append_value(record.flags.has_structured_reasoning);
        quality_pass.append_value(record.flags.quality_pass);
        cluster.append_option(row.cluster.map(|c| c as u32));
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(id.finish()),
        Arc::new(media_kind.finish()),
        Arc::new(file_path.finish()),
        Arc::new(caption.finish()),
        Arc::new(object_caption.finish()),
        Arc::new(semantic_caption.finish()),
        Arc::new(application_caption.finish()),
        Arc::new(caption_json.finish()),
        Arc::new(resolution.finish()),
        Arc::new(width.finish()),
        Arc::new(height.finish()),
        Arc::new(duration.finish()),
        Arc::new(category.finish()),
        Arc::new(keyword.finish()),
        Arc::new(structured.finish()),
        Arc::new(quality_pass.finish()),
        Arc::new(cluster.finish()),
    ];

    Ok(RecordBatch::try_new(schema, columns)?)
}

fn writer_properties() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::ZSTD(Default::default()))
        .build()
}

/// Writes rows to a zstd-compressed Parquet file.
pub fn write_parquet(rows: &[CuratedRow<'_>], output_path: &Path) -> Result<(), ExportError> {
    if rows.is_empty() {
        return Err(ExportError::NoRecords);
    }

    let batch = rows_to_record_batch(rows)?;

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(output_path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(writer_properties()))?;
    writer.write(&batch)?;
    writer.close()?;

    tracing::info!(
        path = %output_path.display(),
        rows = rows.len(),
        "Parquet file written"
    );

    Ok(())
}

/// Writes rows to Parquet bytes in memory.
pub fn write_parquet_bytes(rows: &[CuratedRow<'_>]) -> Result<Vec<u8>, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::NoRecords);
    }

    let batch = rows_to_record_batch(rows)?;

    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), Some(writer_properties()))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(buf)
}

/// Reads records back from a curated Parquet file.
///
/// Rows without an id are skipped. A caption whose JSON no longer parses
/// falls back to the flat caption column.
pub fn read_parquet(input_path: &Path) -> Result<Vec<Record>, ExportError> {
    let file = std::fs::File::open(input_path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let num_rows = batch.num_rows();

        let get_string = |name: &str| -> Vec<Option<String>> {
            batch
                .column_by_name(name)
                .and_then(|col| col.as_any().downcast_ref::<StringArray>())
                .map(|arr| {
                    (0..num_rows)
                        .map(|i| {
                            if arr.is_null(i) {
                                None
                            } else {
                                Some(arr.value(i).to_string())
                            }
                        })
                        .collect()
                })
                .unwrap_or_else(|| vec![None; num_rows])
        };
        let get_bool = |name: &str| -> Vec<bool> {
            batch
                .column_by_name(name)
                .and_then(|col| col.as_any().downcast_ref::<BooleanArray>())
                .map(|arr| (0..num_rows).map(|i| !arr.is_null(i) && arr.value(i)).collect())
                .unwrap_or_else(|| vec![false; num_rows])
        };

        let ids = get_string("id");
        let media_kinds = get_string("media_kind");
        let file_paths = get_string("file_path");
        let captions = get_string("caption");
        let caption_jsons = get_string("caption_json");
        let resolutions = get_string("resolution");
        let categories = get_string("category");
        let keywords = get_string("keyword");
        let structured = get_bool("has_structured_reasoning");
        let passed = get_bool("quality_pass");

        let durations: Vec<f64> = batch
            .column_by_name("duration_secs")
            .and_then(|col| col.as_any().downcast_ref::<Float64Array>())
            .map(|arr| {
                (0..num_rows)
                    .map(|i| if arr.is_null(i) { 0.0 } else { arr.value(i) })
                    .collect()
            })
            .unwrap_or_else(|| vec![0.0; num_rows]);

        for i in 0..num_rows {
            let id = ids[i].clone().unwrap_or_default();
            if id.is_empty() {
                continue;
            }

            let media_kind = media_kinds[i]
                .as_deref()
                .and_then(|s| s.parse::<MediaKind>().ok())
                .unwrap_or(MediaKind::Image);
            let caption = caption_jsons[i]
                .as_deref()
                .and_then(|s| serde_json::from_str::<Caption>(s).ok())
                .unwrap_or_else(|| Caption::flat(captions[i].clone().unwrap_or_default()));

            let mut record = Record::new(id, media_kind, caption)
                .with_file_path(file_paths[i].clone().unwrap_or_default())
                .with_resolution(resolutions[i].clone().unwrap_or_default())
                .with_duration(durations[i])
                .with_category(categories[i].clone().unwrap_or_default())
                .with_keyword(keywords[i].clone().unwrap_or_default());
            record.flags = QualityFlags {
                has_structured_reasoning: structured[i],
                quality_pass: passed[i],
            };

            records.push(record);
        }
    }

    tracing::info!(
        path = %input_path.display(),
        rows = records.len(),
        "Parquet file loaded"
    );

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CaptionEntry;

    fn make_test_record(id: &str) -> Record {
        let caption = Caption::segmented(
            vec![CaptionEntry::with_tokens("항구에 크레인이 서 있다", 12)],
            vec![CaptionEntry::new("물류 산업의 현장")],
            vec![
                CaptionEntry::new("1. 물류 교육 자료"),
                CaptionEntry::new("2. 산업 홍보 영상"),
            ],
        );
        let mut record = Record::new(id, MediaKind::Video, caption)
            .with_resolution("1920, 1080")
            .with_duration(12.5)
            .with_category("산업")
            .with_file_path("videos/clip.mp4");
        record.flags.quality_pass = true;
        record.flags.has_structured_reasoning = true;
        record
    }

    #[test]
    fn test_schema_fields() {
        let schema = curated_schema();
        assert!(schema.field_with_name("id").is_ok());
        assert!(schema.field_with_name("caption_json").is_ok());
        assert!(schema.field_with_name("quality_pass").is_ok());
        assert!(schema.field_with_name("cluster").is_ok());
        assert_eq!(schema.fields().len(), 17);
    }

    #[test]
    fn test_rows_to_record_batch() {
        let a = make_test_record("rec-001");
        let b = Record::new("rec-002", MediaKind::Image, Caption::flat("plain caption"));
        let rows = vec![
            CuratedRow {
                record: &a,
                cluster: Some(3),
            },
            CuratedRow {
                record: &b,
                cluster: None,
            },
        ];
        let batch = rows_to_record_batch(&rows).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 17);

        let width = batch.column_by_name("width").unwrap();
        assert!(width.is_valid(0));
        assert!(width.is_null(1));
    }

    #[test]
    fn test_write_and_read_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("curated.parquet");
        let record = make_test_record("rec-round-trip");

        write_parquet(
            &[CuratedRow {
                record: &record,
                cluster: Some(1),
            }],
            &path,
        )
        .unwrap();
        assert!(path.exists());

        let loaded = read_parquet(&path).unwrap();
        assert_eq!(loaded, vec![record]);
    }

    #[test]
    fn test_write_parquet_bytes() {
        let record = make_test_record("rec-bytes");
        let bytes = write_parquet_bytes(&[CuratedRow {
            record: &record,
            cluster: None,
        }])
        .unwrap();
        // Parquet magic bytes: PAR1
        assert_eq!(&bytes[..4], b"PAR1");
    }

    #[test]
    fn test_empty_rows_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_parquet(&[], &dir.path().join("empty.parquet"));
        assert!(matches!(result, Err(ExportError::NoRecords)));
    }
}
