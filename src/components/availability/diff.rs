use super::models::ExceptionEntry;
use serde::Serialize;
use std::collections::BTreeMap;

/// An exception present on both sides whose content changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedException {
    pub original: ExceptionEntry,
    pub updated: ExceptionEntry,
}

/// What has to happen remotely to turn `original` into `current`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExceptionDiff {
    /// Dates only in the current list
    pub to_add: Vec<ExceptionEntry>,
    /// Dates only in the original list
    pub to_remove: Vec<ExceptionEntry>,
    /// Dates in both lists with different times or availability
    pub changed: Vec<ChangedException>,
}

impl ExceptionDiff {
    /// Nothing to do
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty() && self.changed.is_empty()
    }
}

/// Key a list by date; a later row replaces an earlier one for the same date
fn by_date(entries: &[ExceptionEntry]) -> BTreeMap<&str, &ExceptionEntry> {
    entries.iter().map(|e| (e.date.as_str(), e)).collect()
}

/// Diff two exception lists by date
///
/// Results are in date order.
pub fn diff_exceptions(original: &[ExceptionEntry], current: &[ExceptionEntry]) -> ExceptionDiff {
    let before = by_date(original);
    let after = by_date(current);

    let mut diff = ExceptionDiff::default();

    for (date, entry) in &after {
        match before.get(date) {
            None => diff.to_add.push((*entry).clone()),
            Some(previous) if !previous.same_content(entry) => {
                diff.changed.push(ChangedException {
                    original: (*previous).clone(),
                    updated: (*entry).clone(),
                });
            }
            Some(_) => {}
        }
    }

    for (date, entry) in &before {
        if !after.contains_key(date) {
            diff.to_remove.push((*entry).clone());
        }
    }

    diff
}
