//! Cluster keyword labeling.
//!
//! Every noun occurrence from a bounded sample of each cluster is pooled into
//! one document per cluster, and a second TF-IDF pass across those documents surfaces the
//! words that set each cluster apart from the others.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::vectorizer::TfidfVectorizer;
use crate::categories::{RuleSet, GENERAL_THEME, OTHER_LABEL};
use crate::record::Record;
use crate::text::TextFeatureExtractor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordScore {
    pub keyword: String,
    pub score: f64,
}

/// One cluster as reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub id: usize,
    pub size: usize,
    /// Share of the whole corpus, in percent.
    pub percentage: f64,
    pub keywords: Vec<KeywordScore>,
    pub description: String,
    pub theme: String,
}

/// Labeling settings.
#[derive(Debug, Clone)]
pub struct ClusterLabeler {
    sample_size: usize,
    vocabulary_cap: usize,
    top_keywords: usize,
    description_keywords: usize,
    themes: RuleSet,
    seed: u64,
}

impl Default for ClusterLabeler {
    fn default() -> Self {
        Self {
            sample_size: 20_000,
            vocabulary_cap: 10,
            top_keywords: 5,
            description_keywords: 3,
            themes: RuleSet::default_themes(),
            seed: 42,
        }
    }
}

impl ClusterLabeler {
    pub fn new(sample_size: usize) -> Self {
        Self {
            sample_size,
            ..Default::default()
        }
    }

    pub fn with_themes(mut self, themes: RuleSet) -> Self {
        self.themes = themes;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_vocabulary_cap(mut self, cap: usize) -> Self {
        self.vocabulary_cap = cap;
        self
    }

    /// Summarizes `k` clusters given one label per record.
    pub fn label(
        &self,
        records: &[Record],
        labels: &[usize],
        k: usize,
        extractor: &TextFeatureExtractor,
    ) -> Vec<ClusterSummary> {
        let total = labels.len();
        let mut sizes = vec![0usize; k];
        for &label in labels {
            if label < k {
                sizes[label] += 1;
            }
        }

        let mut sample: Vec<usize> = (0..records.len().min(labels.len())).collect();
        if sample.len() > self.sample_size {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
            sample.shuffle(&mut rng);
            sample.truncate(self.sample_size);
            sample.sort_unstable();
        }

        let mut docs: Vec<Vec<String>> = vec![Vec::new(); k];
        for &i in &sample {
            if labels[i] < k {
                docs[labels[i]].extend(extractor.noun_stream(&records[i].caption_text()));
            }
        }

        let tfidf = TfidfVectorizer::new(self.vocabulary_cap, 1, 1.0).fit_transform(&docs);

        (0..k)
            .map(|id| {
                let keywords: Vec<KeywordScore> = tfidf
                    .top_terms(id, self.top_keywords)
                    .into_iter()
                    .map(|(keyword, score)| KeywordScore { keyword, score })
                    .collect();
                let head: Vec<&str> = keywords
                    .iter()
                    .take(self.description_keywords)
                    .map(|k| k.keyword.as_str())
                    .collect();

                let description = if head.is_empty() {
                    OTHER_LABEL.to_string()
                } else {
                    head.join(", ")
                };
                let theme = self
                    .themes
                    .first_match(&head)
                    .unwrap_or(GENERAL_THEME)
                    .to_string();

                ClusterSummary {
                    id,
                    size: sizes[id],
                    percentage: if total == 0 {
                        0.0
                    } else {
                        sizes[id] as f64 / total as f64 * 100.0
                    },
                    keywords,
                    description,
                    theme,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Caption, MediaKind};

    fn corpus() -> (Vec<Record>, Vec<usize>) {
        let mut records = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let (text, label) = if i % 2 == 0 {
                ("도시 건물 거리 풍경", 0)
            } else {
                ("바다 하늘 해변 풍경", 1)
            };
            records.push(Record::new(i.to_string(), MediaKind::Image, Caption::flat(text)));
            labels.push(label);
        }
        (records, labels)
    }

    #[test]
    fn test_distinctive_keywords_and_themes() {
        let (records, labels) = corpus();
        let summaries =
            ClusterLabeler::default().label(&records, &labels, 2, &TextFeatureExtractor::default());

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].size, 10);
        assert_eq!(summaries[0].percentage, 50.0);

        // the shared word scores below the cluster-specific ones
        let first = &summaries[0].keywords;
        assert_eq!(first.len(), 4);
        assert_eq!(first.last().unwrap().keyword, "풍경");

        assert_eq!(summaries[0].theme, "urban/architecture");
        assert_eq!(summaries[1].theme, "nature/landscape");
        assert_eq!(summaries[0].description.split(", ").count(), 3);
    }

    #[test]
    fn test_empty_cluster_gets_defaults() {
        let (records, labels) = corpus();
        let summaries =
            ClusterLabeler::default().label(&records, &labels, 3, &TextFeatureExtractor::default());

        assert_eq!(summaries[2].size, 0);
        assert!(summaries[2].keywords.is_empty());
        assert_eq!(summaries[2].description, OTHER_LABEL);
        assert_eq!(summaries[2].theme, GENERAL_THEME);
    }

    #[test]
    fn test_repeated_noun_outranks_single_mentions() {
        // "공장" appears in few records but many times within each caption
        let mut records = Vec::new();
        for i in 0..6 {
            let text = if i < 2 {
                "공장 공장 공장 공장 공장 공장 공장 공장"
            } else {
                "구름 나무 벤치"
            };
            records.push(Record::new(i.to_string(), MediaKind::Image, Caption::flat(text)));
        }
        records.push(Record::new("x", MediaKind::Image, Caption::flat("구름 나무 벤치 공장")));
        let mut labels = vec![0; 6];
        labels.push(1);

        let summaries =
            ClusterLabeler::default().label(&records, &labels, 2, &TextFeatureExtractor::default());

        assert_eq!(summaries[0].keywords[0].keyword, "공장");
        assert_eq!(summaries[0].theme, "industry/site");
    }

    #[test]
    fn test_unmatched_theme_is_general() {
        let records = vec![Record::new("a", MediaKind::Image, Caption::flat("coffee latte"))];
        let summaries =
            ClusterLabeler::default().label(&records, &[0], 1, &TextFeatureExtractor::default());
        assert_eq!(summaries[0].theme, GENERAL_THEME);
        assert_eq!(summaries[0].description, "coffee, latte");
    }
}
