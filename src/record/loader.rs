//! Corpus loading from record files and raw annotation trees.

use std::collections::HashSet;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::annotation::RawAnnotation;
use super::types::{MediaKind, Record};
use crate::error::LoadError;

/// Counters for inputs that were skipped while loading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub loaded: usize,
    pub invalid_json: usize,
    pub missing_caption: usize,
    pub missing_media: usize,
    pub duplicate_id: usize,
}

impl LoadStats {
    pub fn skipped(&self) -> usize {
        self.invalid_json + self.missing_caption + self.missing_media + self.duplicate_id
    }
}

/// Result of a load: records in input order plus skip counters.
#[derive(Debug, Clone, Default)]
pub struct LoadedCorpus {
    pub records: Vec<Record>,
    pub stats: LoadStats,
}

/// Loads records from a JSONL file or a raw annotation directory.
#[derive(Debug, Clone, Default)]
pub struct CorpusLoader {
    require_media: bool,
}

impl CorpusLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip annotations whose media file is not next to them.
    pub fn with_require_media(mut self, require_media: bool) -> Self {
        self.require_media = require_media;
        self
    }

    /// Reads one `Record` per line. Blank lines are ignored.
    pub fn load_jsonl(&self, path: &Path) -> Result<LoadedCorpus, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound(path.display().to_string()));
        }

        let reader = BufReader::new(fs::File::open(path)?);
        let mut corpus = LoadedCorpus::default();
        let mut seen = HashSet::new();

        for (line_no, bytes) in reader.split(b'\n').enumerate() {
            let line = match String::from_utf8(bytes?) {
                Ok(line) => line,
                Err(e) => {
                    debug!(line = line_no + 1, error = %e, "Skipping non UTF-8 record line");
                    corpus.stats.invalid_json += 1;
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Record>(&line) {
                Ok(record) => push_unique(&mut corpus, &mut seen, record),
                Err(e) => {
                    debug!(line = line_no + 1, error = %e, "Skipping malformed record line");
                    corpus.stats.invalid_json += 1;
                }
            }
        }

        corpus.stats.loaded = corpus.records.len();
        info!(
            path = %path.display(),
            loaded = corpus.stats.loaded,
            skipped = corpus.stats.skipped(),
            "Loaded record file"
        );
        Ok(corpus)
    }

    /// Walks `root` recursively and converts every `.json` annotation.
    ///
    /// Files are visited in sorted path order so repeated loads of the same
    /// tree yield the same record order.
    pub fn load_annotation_dir(&self, root: &Path) -> Result<LoadedCorpus, LoadError> {
        if !root.exists() {
            return Err(LoadError::NotFound(root.display().to_string()));
        }
        if !root.is_dir() {
            return Err(LoadError::NotADirectory(root.display().to_string()));
        }

        let mut corpus = LoadedCorpus::default();
        let mut seen = HashSet::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Unreadable directory entry, skipping");
                    corpus.stats.invalid_json += 1;
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || !is_json(path) {
                continue;
            }

            let media_kind = match infer_media_kind(path) {
                Some(kind) => kind,
                None => {
                    debug!(path = %path.display(), "Cannot tell media kind, skipping");
                    corpus.stats.missing_media += 1;
                    continue;
                }
            };

            if self.require_media && media_sibling(path, media_kind).is_none() {
                corpus.stats.missing_media += 1;
                continue;
            }

            let raw = match fs::read_to_string(path)
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str::<RawAnnotation>(&s).map_err(|e| e.to_string()))
            {
                Ok(raw) => raw,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Unreadable annotation");
                    corpus.stats.invalid_json += 1;
                    continue;
                }
            };

            if raw.labeling_data_info.caption_info.is_empty() {
                corpus.stats.missing_caption += 1;
                continue;
            }

            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mut record = raw.into_record(&stem, media_kind);
            if let Some(media) = media_sibling(path, media_kind) {
                record.file_path = media.display().to_string();
            }
            push_unique(&mut corpus, &mut seen, record);
        }

        corpus.stats.loaded = corpus.records.len();
        if corpus.stats.skipped() > 0 {
            warn!(
                invalid_json = corpus.stats.invalid_json,
                missing_caption = corpus.stats.missing_caption,
                missing_media = corpus.stats.missing_media,
                duplicate_id = corpus.stats.duplicate_id,
                "Some annotations were skipped"
            );
        }
        info!(
            root = %root.display(),
            loaded = corpus.stats.loaded,
            "Loaded annotation tree"
        );
        Ok(corpus)
    }
}

fn push_unique(corpus: &mut LoadedCorpus, seen: &mut HashSet<String>, record: Record) {
    if seen.insert(record.id.clone()) {
        corpus.records.push(record);
    } else {
        corpus.stats.duplicate_id += 1;
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Media kind from an `image`/`video` directory component, then from a
/// sibling media file.
fn infer_media_kind(path: &Path) -> Option<MediaKind> {
    for component in path.components().rev().skip(1) {
        let name = component.as_os_str().to_string_lossy().to_ascii_lowercase();
        match name.as_str() {
            "image" | "images" => return Some(MediaKind::Image),
            "video" | "videos" => return Some(MediaKind::Video),
            _ => {}
        }
    }

    [MediaKind::Video, MediaKind::Image]
        .into_iter()
        .find(|kind| media_sibling(path, *kind).is_some())
}

fn media_sibling(path: &Path, kind: MediaKind) -> Option<PathBuf> {
    let candidate = path.with_extension(kind.default_extension());
    candidate.exists().then_some(candidate)
}
