//! Keyword rule lists for caption categories and cluster themes.

mod rules;

pub use rules::{KeywordRule, RuleSet, GENERAL_THEME, OTHER_LABEL};
