//! Exact-duplicate caption detection.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Characters of the caption compared for duplicates.
pub const DUPLICATE_PREFIX_CHARS: usize = 200;

/// Records sharing the same caption prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub prefix: String,
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub groups: Vec<DuplicateGroup>,
    /// Records beyond the first in every group.
    pub redundant_records: usize,
}

impl DuplicateReport {
    /// Groups of two or more non-empty captions with the same prefix, in
    /// order of first appearance.
    pub fn compute(records: &[Record]) -> Self {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<DuplicateGroup> = Vec::new();

        for record in records {
            let text = record.caption_text();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }
            let prefix: String = trimmed.chars().take(DUPLICATE_PREFIX_CHARS).collect();
            match index.get(&prefix) {
                Some(&i) => groups[i].ids.push(record.id.clone()),
                None => {
                    index.insert(prefix.clone(), groups.len());
                    groups.push(DuplicateGroup {
                        prefix,
                        ids: vec![record.id.clone()],
                    });
                }
            }
        }

        groups.retain(|g| g.ids.len() > 1);
        let redundant_records = groups.iter().map(|g| g.ids.len() - 1).sum();
        Self {
            groups,
            redundant_records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Caption, MediaKind};

    #[test]
    fn test_groups_by_prefix() {
        let shared = "x".repeat(DUPLICATE_PREFIX_CHARS);
        let records = vec![
            Record::new("a", MediaKind::Image, Caption::flat(format!("{shared} tail one"))),
            Record::new("b", MediaKind::Image, Caption::flat("unique")),
            Record::new("c", MediaKind::Video, Caption::flat(format!("{shared} tail two"))),
            Record::new("d", MediaKind::Video, Caption::flat("")),
            Record::new("e", MediaKind::Video, Caption::flat("")),
        ];
        let report = DuplicateReport::compute(&records);

        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].ids, vec!["a", "c"]);
        assert_eq!(report.redundant_records, 1);
    }
}
