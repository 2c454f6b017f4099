//! Duration versus caption length correlation for videos.

use serde::{Deserialize, Serialize};

use crate::record::{MediaKind, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    Moderate,
    Strong,
}

impl Strength {
    /// Weak below 0.3, moderate below 0.7, strong otherwise.
    pub fn of(r: f64) -> Self {
        let r = r.abs();
        if r < 0.3 {
            Strength::Weak
        } else if r < 0.7 {
            Strength::Moderate
        } else {
            Strength::Strong
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationCaptionCorrelation {
    /// Videos with a positive duration and a non-empty caption.
    pub samples: usize,
    pub pearson_r: f64,
    pub strength: Strength,
    pub direction: Direction,
}

impl DurationCaptionCorrelation {
    pub fn compute(records: &[Record]) -> Self {
        let pairs: Vec<(f64, f64)> = records
            .iter()
            .filter(|r| r.media_kind == MediaKind::Video && r.duration_secs > 0.0)
            .filter_map(|r| {
                let len = r.caption_text().chars().count();
                (len > 0).then_some((r.duration_secs, len as f64))
            })
            .collect();

        let r = pearson(&pairs);
        Self {
            samples: pairs.len(),
            pearson_r: r,
            strength: Strength::of(r),
            direction: if r >= 0.0 {
                Direction::Positive
            } else {
                Direction::Negative
            },
        }
    }
}

/// Pearson correlation over mean-centered values.
///
/// Returns 0.0 for fewer than two pairs or zero variance on either side.
pub fn pearson(pairs: &[(f64, f64)]) -> f64 {
    if pairs.len() < 2
        || is_constant(pairs.iter().map(|p| p.0))
        || is_constant(pairs.iter().map(|p| p.1))
    {
        return 0.0;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        let (dx, dy) = (x - mean_x, y - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if !(sxx > 0.0 && syy > 0.0) {
        return 0.0;
    }
    let r = sxy / (sxx.sqrt() * syy.sqrt());
    if r.is_finite() {
        r.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// True when every value equals the first; the mean of a constant column
/// can differ from it in the last bit.
fn is_constant(mut values: impl Iterator<Item = f64>) -> bool {
    match values.next() {
        Some(first) => values.all(|v| v == first),
        None => true,
    }
}
