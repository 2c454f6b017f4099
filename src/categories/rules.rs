//! Ordered keyword rule lists.
//!
//! Both caption categories and cluster themes are decided by walking an
//! ordered list of `(label, keywords)` pairs. Order matters: themes take the
//! first rule that matches, categories keep every rule that matches in list
//! order.

use serde::{Deserialize, Serialize};

/// Label used when no category rule matches.
pub const OTHER_LABEL: &str = "other";

/// Theme used when no theme rule matches.
pub const GENERAL_THEME: &str = "general";

/// One labeled keyword list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub label: String,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new(label: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            label: label.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// True if any keyword occurs as a substring of `text`.
    pub fn matches_text(&self, text: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && text.contains(k.as_str()))
    }

    /// True if any keyword equals one of `words`.
    pub fn matches_any_word<S: AsRef<str>>(&self, words: &[S]) -> bool {
        words
            .iter()
            .any(|w| self.keywords.iter().any(|k| k == w.as_ref()))
    }
}

/// An ordered list of keyword rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<KeywordRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        Self { rules }
    }

    /// Caption categories grouped by visual subject.
    pub fn default_categories() -> Self {
        Self::new(vec![
            KeywordRule::new(
                "urban",
                &[
                    "도시", "건물", "도로", "차량", "거리", "교통", "건축", "주차", "고속도로",
                    "아파트", "빌딩", "버스", "자동차", "트럭",
                ],
            ),
            KeywordRule::new(
                "nature",
                &[
                    "자연", "산", "바다", "나무", "숲", "강", "호수", "해변", "하늘", "구름",
                    "경치", "풍경", "계곡", "들판",
                ],
            ),
            KeywordRule::new(
                "people",
                &[
                    "사람", "남성", "여성", "학생", "군중", "인물", "얼굴", "손", "발", "사람들",
                    "인원", "관객",
                ],
            ),
            KeywordRule::new(
                "indoor",
                &[
                    "실내", "교실", "회의실", "병원", "방", "사무실", "강당", "복도", "천장", "벽",
                    "바닥", "침대",
                ],
            ),
            KeywordRule::new(
                "action",
                &[
                    "걷는", "달리", "뛰", "움직", "이동", "운동", "경기", "춤", "작업", "수행",
                    "진행", "활동",
                ],
            ),
            KeywordRule::new(
                "object",
                &[
                    "컨테이너", "크레인", "기계", "장비", "도구", "제품", "물건", "용기", "상자",
                ],
            ),
            KeywordRule::new(
                "animal",
                &["동물", "새", "고양이", "개", "물고기", "곤충", "말", "소"],
            ),
            KeywordRule::new(
                "food",
                &["음식", "요리", "식품", "먹", "밥", "국", "빵", "과일", "야채"],
            ),
        ])
    }

    /// Coarse cluster themes, checked against a cluster's top keywords.
    pub fn default_themes() -> Self {
        Self::new(vec![
            KeywordRule::new("urban/architecture", &["건물", "도시", "건축", "거리", "도로"]),
            KeywordRule::new("nature/landscape", &["자연", "풍경", "산", "바다", "하늘"]),
            KeywordRule::new("tradition/culture", &["전통", "문화", "역사", "유적"]),
            KeywordRule::new("industry/site", &["산업", "공장", "현장", "건설"]),
            KeywordRule::new("transport", &["교통", "차량", "도로", "이동"]),
            KeywordRule::new("education", &["교육", "학교", "학생", "수업"]),
            KeywordRule::new("indoor", &["실내", "내부", "방", "공간"]),
        ])
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Labels in rule order followed by the catch-all label.
    pub fn labels_with_other(&self) -> Vec<String> {
        self.rules
            .iter()
            .map(|r| r.label.clone())
            .chain(std::iter::once(OTHER_LABEL.to_string()))
            .collect()
    }

    /// Every label whose keywords occur in `text`, in rule order.
    ///
    /// A record with no match belongs to [`OTHER_LABEL`] alone.
    pub fn classify(&self, text: &str) -> Vec<String> {
        let labels: Vec<String> = self
            .rules
            .iter()
            .filter(|rule| rule.matches_text(text))
            .map(|rule| rule.label.clone())
            .collect();

        if labels.is_empty() {
            vec![OTHER_LABEL.to_string()]
        } else {
            labels
        }
    }

    /// Label of the first rule sharing a keyword with `words`.
    pub fn first_match<S: AsRef<str>>(&self, words: &[S]) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.matches_any_word(words))
            .map(|rule| rule.label.as_str())
    }
}
