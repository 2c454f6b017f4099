//! Sample scores used to rank records inside a sampling quota.

use serde::{Deserialize, Serialize};

use crate::record::{MediaKind, Record};

/// Upper bound of every sample score.
pub const MAX_SAMPLE_SCORE: f64 = 100.0;

/// Ranks records for quota selection. Higher is better.
pub trait SampleScorer: Send + Sync {
    fn score(&self, record: &Record) -> f64;
}

impl<F> SampleScorer for F
where
    F: Fn(&Record) -> f64 + Send + Sync,
{
    fn score(&self, record: &Record) -> f64 {
        self(record)
    }
}

/// Weights of the heuristic sample score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicWeights {
    pub base: f64,
    /// Caption longer than 500 chars.
    pub long_caption: f64,
    /// Caption longer than 200 chars.
    pub medium_caption: f64,
    /// Caption longer than 100 chars.
    pub short_caption: f64,
    pub resolution_bonus: f64,
    /// Substrings of the resolution string that earn the bonus.
    pub preferred_resolution_markers: Vec<String>,
    pub video_bonus: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            base: 50.0,
            long_caption: 30.0,
            medium_caption: 20.0,
            short_caption: 10.0,
            resolution_bonus: 10.0,
            preferred_resolution_markers: vec!["1280".to_string(), "720".to_string()],
            video_bonus: 10.0,
        }
    }
}

/// Caption length, resolution and media kind heuristic, capped at 100.
#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    weights: HeuristicWeights,
}

impl HeuristicScorer {
    pub fn new(weights: HeuristicWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &HeuristicWeights {
        &self.weights
    }
}

impl SampleScorer for HeuristicScorer {
    fn score(&self, record: &Record) -> f64 {
        let w = &self.weights;
        let mut score = w.base;

        let caption_len = record.caption_text().chars().count();
        if caption_len > 500 {
            score += w.long_caption;
        } else if caption_len > 200 {
            score += w.medium_caption;
        } else if caption_len > 100 {
            score += w.short_caption;
        }

        if w
            .preferred_resolution_markers
            .iter()
            .any(|m| !m.is_empty() && record.resolution.contains(m.as_str()))
        {
            score += w.resolution_bonus;
        }

        if record.media_kind == MediaKind::Video {
            score += w.video_bonus;
        }

        score.clamp(0.0, MAX_SAMPLE_SCORE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Caption;

    fn record(kind: MediaKind, caption_len: usize, resolution: &str) -> Record {
        Record::new("s", kind, Caption::flat("x".repeat(caption_len))).with_resolution(resolution)
    }

    #[test]
    fn test_heuristic_score_components() {
        let scorer = HeuristicScorer::default();
        assert_eq!(scorer.score(&record(MediaKind::Image, 50, "640, 480")), 50.0);
        assert_eq!(scorer.score(&record(MediaKind::Image, 150, "640, 480")), 60.0);
        assert_eq!(scorer.score(&record(MediaKind::Image, 300, "1280, 720")), 80.0);
        assert_eq!(scorer.score(&record(MediaKind::Video, 50, "1920, 1080")), 60.0);
    }

    #[test]
    fn test_heuristic_score_is_capped() {
        let scorer = HeuristicScorer::default();
        assert_eq!(scorer.score(&record(MediaKind::Video, 800, "1280, 720")), 100.0);
    }

    #[test]
    fn test_custom_weights() {
        let weights = HeuristicWeights {
            video_bonus: 0.0,
            preferred_resolution_markers: vec!["1920".to_string()],
            ..Default::default()
        };
        let scorer = HeuristicScorer::new(weights);
        assert_eq!(scorer.score(&record(MediaKind::Video, 50, "1920, 1080")), 60.0);
    }

    #[test]
    fn test_closure_is_a_scorer() {
        let by_len = |r: &Record| r.caption_text().len() as f64;
        assert_eq!(by_len.score(&record(MediaKind::Image, 7, "")), 7.0);
    }
}
