//! Normalized representation of one annotated media sample.

use serde::{Deserialize, Serialize};

/// Kind of media a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Returns the lowercase label used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// Infers the media kind from a file extension, if recognized.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" | "jpg" | "jpeg" | "webp" => Some(MediaKind::Image),
            "mp4" | "avi" | "mov" | "mkv" => Some(MediaKind::Video),
            _ => None,
        }
    }

    /// Extension of the media file that sits next to an annotation.
    pub fn default_extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "png",
            MediaKind::Video => "mp4",
        }
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            other => Err(format!("unknown media kind '{}'", other)),
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Hierarchical caption level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionLevel {
    /// What is literally visible.
    Object,
    /// What the scene means.
    Semantic,
    /// Where the clip can be used.
    Application,
}

impl CaptionLevel {
    /// All levels in concatenation order.
    pub fn all() -> [CaptionLevel; 3] {
        [
            CaptionLevel::Object,
            CaptionLevel::Semantic,
            CaptionLevel::Application,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaptionLevel::Object => "object",
            CaptionLevel::Semantic => "semantic",
            CaptionLevel::Application => "application",
        }
    }
}

/// One caption sentence or paragraph with its annotator-supplied token count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptionEntry {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u32>,
}

impl CaptionEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            token_count: None,
        }
    }

    pub fn with_tokens(text: impl Into<String>, token_count: u32) -> Self {
        Self {
            text: text.into(),
            token_count: Some(token_count),
        }
    }
}

/// Caption text, either segmented by level or a single flat string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "CaptionRepr")]
pub struct Caption {
    /// Flat caption used when no segments are known.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object: Vec<CaptionEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub semantic: Vec<CaptionEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub application: Vec<CaptionEntry>,
}

/// Accepts either `"caption": "..."` or the segmented object form.
#[derive(Deserialize)]
#[serde(untagged)]
enum CaptionRepr {
    Plain(String),
    Structured {
        #[serde(default)]
        text: String,
        #[serde(default)]
        object: Vec<CaptionEntry>,
        #[serde(default)]
        semantic: Vec<CaptionEntry>,
        #[serde(default)]
        application: Vec<CaptionEntry>,
    },
}

impl From<CaptionRepr> for Caption {
    fn from(repr: CaptionRepr) -> Self {
        match repr {
            CaptionRepr::Plain(text) => Caption::flat(text),
            CaptionRepr::Structured {
                text,
                object,
                semantic,
                application,
            } => Caption {
                text,
                object,
                semantic,
                application,
            },
        }
    }
}

impl Caption {
    /// Creates a caption with no segment structure.
    pub fn flat(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Creates a segmented caption.
    pub fn segmented(
        object: Vec<CaptionEntry>,
        semantic: Vec<CaptionEntry>,
        application: Vec<CaptionEntry>,
    ) -> Self {
        Self {
            text: String::new(),
            object,
            semantic,
            application,
        }
    }

    /// Entries of one level.
    pub fn entries(&self, level: CaptionLevel) -> &[CaptionEntry] {
        match level {
            CaptionLevel::Object => &self.object,
            CaptionLevel::Semantic => &self.semantic,
            CaptionLevel::Application => &self.application,
        }
    }

    /// True when any level carries at least one entry.
    pub fn is_segmented(&self) -> bool {
        !(self.object.is_empty() && self.semantic.is_empty() && self.application.is_empty())
    }

    /// Concatenated text of one level.
    pub fn level_text(&self, level: CaptionLevel) -> String {
        join_entries(self.entries(level))
    }

    /// The whole caption reduced to one string.
    ///
    /// Segments are joined in object, semantic, application order. The flat
    /// text is used only when there are no segments.
    pub fn full_text(&self) -> String {
        if !self.is_segmented() {
            return self.text.clone();
        }
        let parts: Vec<&str> = CaptionLevel::all()
            .iter()
            .flat_map(|level| self.entries(*level))
            .map(|entry| entry.text.as_str())
            .filter(|text| !text.is_empty())
            .collect();
        parts.join(" ")
    }
}

fn join_entries(entries: &[CaptionEntry]) -> String {
    entries
        .iter()
        .map(|e| e.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quality flags written back onto a record after scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityFlags {
    pub has_structured_reasoning: bool,
    pub quality_pass: bool,
}

/// One annotated media sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier, unique within one corpus snapshot.
    pub id: String,
    pub media_kind: MediaKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_path: String,
    pub caption: Caption,
    /// Raw resolution string such as `"1920, 1080"`.
    #[serde(default)]
    pub resolution: String,
    /// Seconds; 0 for images or unparseable lengths.
    #[serde(default)]
    pub duration_secs: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub flags: QualityFlags,
}

impl Record {
    /// Creates a record with a flat caption and empty metadata.
    pub fn new(id: impl Into<String>, media_kind: MediaKind, caption: Caption) -> Self {
        Self {
            id: id.into(),
            media_kind,
            file_path: String::new(),
            caption,
            resolution: String::new(),
            duration_secs: 0.0,
            category: String::new(),
            keyword: String::new(),
            flags: QualityFlags::default(),
        }
    }

    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = resolution.into();
        self
    }

    pub fn with_duration(mut self, duration_secs: f64) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = keyword.into();
        self
    }

    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = file_path.into();
        self
    }

    /// Caption reduced to one string for tokenization.
    pub fn caption_text(&self) -> String {
        self.caption.full_text()
    }

    /// Parsed `(width, height)` if the resolution string is well formed.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        parse_resolution(&self.resolution)
    }
}

/// Parses `"HH:MM:SS"` (seconds may be fractional) or a bare number of seconds.
///
/// Returns 0.0 for anything else, matching how unparseable lengths are
/// treated across the corpus.
pub fn parse_duration(raw: &str) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0.0;
    }

    let parts: Vec<&str> = raw.split(':').collect();
    let parsed = match parts.as_slice() {
        [h, m, s] => match (
            h.trim().parse::<u64>(),
            m.trim().parse::<u64>(),
            s.trim().parse::<f64>(),
        ) {
            (Ok(h), Ok(m), Ok(s)) => Some(h as f64 * 3600.0 + m as f64 * 60.0 + s),
            _ => None,
        },
        [single] => single.parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(secs) if secs.is_finite() && secs >= 0.0 => secs,
        _ => 0.0,
    }
}

/// Parses `"1920, 1080"` or `"1920x1080"` into `(width, height)`.
pub fn parse_resolution(raw: &str) -> Option<(u32, u32)> {
    let mut parts = raw.split([',', 'x', 'X', '×']).map(str::trim);
    let width = parts.next()?.parse().ok()?;
    let height = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_text_joins_levels_in_order() {
        let caption = Caption::segmented(
            vec![CaptionEntry::with_tokens("a tractor", 2)],
            vec![CaptionEntry::new("modern farming")],
            vec![CaptionEntry::new("1) education")],
        );
        assert_eq!(caption.full_text(), "a tractor modern farming 1) education");
    }

    #[test]
    fn test_full_text_falls_back_to_flat() {
        let caption = Caption::flat("just one line");
        assert!(!caption.is_segmented());
        assert_eq!(caption.full_text(), "just one line");
    }

    #[test]
    fn test_caption_deserializes_plain_string() {
        let json = r#"{"id":"c1","media_kind":"video","caption":"hello world"}"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.caption_text(), "hello world");
        assert_eq!(record.duration_secs, 0.0);
    }

    #[test]
    fn test_caption_deserializes_segments() {
        let json = r#"{
            "id": "c2",
            "media_kind": "image",
            "caption": {"object": [{"text": "a dog", "token_count": 2}], "application": [{"text": "1) pets"}]}
        }"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert!(record.caption.is_segmented());
        assert_eq!(record.caption.object[0].token_count, Some(2));
        assert_eq!(record.caption_text(), "a dog 1) pets");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("00:01:05"), 65.0);
        assert!((parse_duration("01:00:02.5") - 3602.5).abs() < 1e-9);
        assert_eq!(parse_duration("12.5"), 12.5);
        assert_eq!(parse_duration("00:00:05;04"), 0.0);
        assert_eq!(parse_duration("garbage"), 0.0);
        assert_eq!(parse_duration(""), 0.0);
    }

    #[test]
    fn test_parse_resolution() {
        assert_eq!(parse_resolution("1920, 1080"), Some((1920, 1080)));
        assert_eq!(parse_resolution("1280x720"), Some((1280, 720)));
        assert_eq!(parse_resolution("wide"), None);
        assert_eq!(parse_resolution(""), None);
    }

    #[test]
    fn test_media_kind_from_extension() {
        assert_eq!(MediaKind::from_extension("MP4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_extension("png"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_extension("txt"), None);
    }
}
