//! Column emptiness scan and mapping prune.
//!
//! The scan is a complete pass over every data row and yields an immutable
//! [`ColumnEmptiness`]; only then does [`prune_mapping`] consume it and mutate the mapping.

use std::collections::HashSet;

use crate::types::ColumnMapping;

/// Per-column "every value seen so far is empty" flags, indexed like the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnEmptiness {
    flags: Vec<bool>,
}

impl ColumnEmptiness {
    /// Scan all `rows` once. Every header column starts empty and flips to populated on its
    /// first non-empty value. Cells past a short row's end leave the flag untouched; cells
    /// past the header's width are ignored.
    pub fn scan<R: AsRef<[String]>>(header_len: usize, rows: &[R]) -> Self {
        let mut flags = vec![true; header_len];
        for row in rows {
            for (idx, value) in row.as_ref().iter().enumerate().take(header_len) {
                if flags[idx] && !value.is_empty() {
                    flags[idx] = false;
                }
            }
        }
        Self { flags }
    }

    pub fn is_empty_at(&self, idx: usize) -> bool {
        self.flags.get(idx).copied().unwrap_or(true)
    }

    /// Indexes of columns that never held a value.
    pub fn empty_indexes(&self) -> impl Iterator<Item = usize> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(idx, &empty)| empty.then_some(idx))
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Remove every mapping entry whose source header names only empty columns.
///
/// A header name that occurs more than once is kept if any of its columns is populated.
/// Returns the removed source names in header order.
pub fn prune_mapping(header: &[String], emptiness: ColumnEmptiness, mapping: &mut ColumnMapping) -> Vec<String> {
    let populated: HashSet<&str> = header
        .iter()
        .enumerate()
        .filter(|(idx, _)| !emptiness.is_empty_at(*idx))
        .map(|(_, name)| name.as_str())
        .collect();

    let mut removed = Vec::new();
    for idx in emptiness.empty_indexes() {
        let Some(name) = header.get(idx) else { continue };
        if populated.contains(name.as_str()) {
            continue;
        }
        if mapping.remove(name).is_some() {
            removed.push(name.clone());
        }
    }
    removed
}
