//! Raw annotation documents as produced by the labeling tool.
//!
//! Every field is optional on the wire; missing sections deserialize to
//! empty defaults so that partially filled annotations still load.

use serde::Deserialize;

use super::types::{parse_duration, Caption, CaptionEntry, MediaKind, Record};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAnnotation {
    #[serde(default)]
    pub source_data_info: SourceDataInfo,
    #[serde(default)]
    pub raw_data_info: RawDataInfo,
    #[serde(default)]
    pub labeling_data_info: LabelingDataInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceDataInfo {
    #[serde(default)]
    pub clip_id: Option<String>,
    #[serde(default)]
    pub ai_generated_info: AiGeneratedInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiGeneratedInfo {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub mid_category: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDataInfo {
    #[serde(default)]
    pub source_media_info: SourceMediaInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceMediaInfo {
    #[serde(default)]
    pub resolution: String,
    #[serde(default)]
    pub details: MediaDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaDetails {
    #[serde(default)]
    pub length: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelingDataInfo {
    #[serde(default)]
    pub caption_info: CaptionInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaptionInfo {
    #[serde(default)]
    pub object_level: Vec<RawCaptionEntry>,
    #[serde(default)]
    pub semantic_level: Vec<RawCaptionEntry>,
    #[serde(default)]
    pub application_level: Vec<RawCaptionEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCaptionEntry {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub token: Option<u32>,
}

impl From<RawCaptionEntry> for CaptionEntry {
    fn from(raw: RawCaptionEntry) -> Self {
        CaptionEntry {
            text: raw.text.trim().to_string(),
            token_count: raw.token,
        }
    }
}

impl CaptionInfo {
    pub fn is_empty(&self) -> bool {
        self.object_level.is_empty()
            && self.semantic_level.is_empty()
            && self.application_level.is_empty()
    }
}

impl RawAnnotation {
    /// Converts the annotation into a record.
    ///
    /// `fallback_id` is used when the document carries no clip id (usually
    /// the annotation file stem).
    pub fn into_record(self, fallback_id: &str, media_kind: MediaKind) -> Record {
        let id = self
            .source_data_info
            .clip_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| fallback_id.to_string());

        let info = self.labeling_data_info.caption_info;
        let caption = Caption::segmented(
            info.object_level.into_iter().map(Into::into).collect(),
            info.semantic_level.into_iter().map(Into::into).collect(),
            info.application_level.into_iter().map(Into::into).collect(),
        );

        let media = self.raw_data_info.source_media_info;
        let duration_secs = match media_kind {
            MediaKind::Video => media
                .details
                .length
                .as_deref()
                .map(parse_duration)
                .unwrap_or(0.0),
            MediaKind::Image => 0.0,
        };

        let ai = self.source_data_info.ai_generated_info;
        Record::new(id, media_kind, caption)
            .with_resolution(media.resolution)
            .with_duration(duration_secs)
            .with_category(ai.mid_category)
            .with_keyword(ai.keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "source_data_info": {
            "clip_id": "clip_0001",
            "ai_generated_info": {"keyword": "시장", "mid_category": "생활", "stt_script": ""}
        },
        "raw_data_info": {
            "source_media_info": {
                "resolution": "1920, 1080",
                "details": {"length": "00:00:42", "frame_rate": 29.97}
            }
        },
        "labeling_data_info": {
            "caption_info": {
                "object_level": [{"text": "상인이 과일을 정리한다", "token": 6, "tc_in": "00:00:00", "tc_out": "00:00:10"}],
                "semantic_level": [{"text": "전통 시장의 아침 풍경", "token": 5}],
                "application_level": [{"text": "1) 관광 홍보 2) 교육 자료", "token": 7}]
            }
        }
    }"#;

    #[test]
    fn test_annotation_into_video_record() {
        let raw: RawAnnotation = serde_json::from_str(SAMPLE).unwrap();
        let record = raw.into_record("fallback", MediaKind::Video);

        assert_eq!(record.id, "clip_0001");
        assert_eq!(record.duration_secs, 42.0);
        assert_eq!(record.dimensions(), Some((1920, 1080)));
        assert_eq!(record.category, "생활");
        assert_eq!(record.keyword, "시장");
        assert_eq!(record.caption.object[0].token_count, Some(6));
        assert_eq!(
            record.caption_text(),
            "상인이 과일을 정리한다 전통 시장의 아침 풍경 1) 관광 홍보 2) 교육 자료"
        );
    }

    #[test]
    fn test_image_has_no_duration_and_fallback_id() {
        let raw: RawAnnotation = serde_json::from_str(
            r#"{"raw_data_info": {"source_media_info": {"details": {"length": "00:00:42"}}}}"#,
        )
        .unwrap();
        let record = raw.into_record("img_7", MediaKind::Image);

        assert_eq!(record.id, "img_7");
        assert_eq!(record.duration_secs, 0.0);
        assert!(!record.caption.is_segmented());
    }
}
