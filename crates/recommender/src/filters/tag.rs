//! Filter to keep only movies carrying at least one requested tag.

use crate::traits::Filter;
use data_loader::MovieRecord;
use data_loader::parser::normalize_term;
use std::collections::BTreeSet;

/// Keeps candidates whose tag set intersects the requested tags.
pub struct TagFilter {
    tags: BTreeSet<String>,
}

impl TagFilter {
    /// Create a new TagFilter.
    ///
    /// Tags are trimmed and lowercased here so they compare equal to the
    /// catalog's normalized tag sets; blank tags are dropped.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = tags
            .into_iter()
            .map(|t| normalize_term(t.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();
        Self { tags }
    }
}

impl Filter for TagFilter {
    fn name(&self) -> &str {
        "TagFilter"
    }

    fn accepts(&self, record: &MovieRecord) -> bool {
        record.has_any_tag(self.tags.iter().map(String::as_str))
    }
}
