//! Row renaming and value normalization.

use std::collections::HashMap;

use crate::types::ColumnMapping;

use super::dates;

/// Markers used when the caller configures none.
pub const DEFAULT_TEMPORAL_MARKERS: &[&str] = &["时间", "日期", "time", "date", "datetime", "timestamp", "at"];

/// Markers that flag a canonical column name as temporal.
///
/// Matching is case-insensitive. A marker containing CJK text matches anywhere in the name
/// (`更新时间`). An ASCII marker matches whole words only: the name is split on `_`, `-`,
/// `.`, spaces and camelCase humps, so `at` matches `created_at` and `updatedAt` but not
/// `data_attr`, and `time` matches `start_time` but not `runtime_ms`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalMarkers(Vec<Marker>);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Marker {
    Substring(String),
    Words(Vec<String>),
}

impl TemporalMarkers {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let markers = markers
            .into_iter()
            .filter_map(|m| {
                let m = m.as_ref().trim();
                if m.is_ascii() {
                    let words = split_words(m);
                    (!words.is_empty()).then_some(Marker::Words(words))
                } else {
                    (!m.is_empty()).then(|| Marker::Substring(m.to_lowercase()))
                }
            })
            .collect();
        Self(markers)
    }

    pub fn matches(&self, canonical: &str) -> bool {
        let lower = canonical.to_lowercase();
        let words = split_words(canonical);
        self.0.iter().any(|marker| match marker {
            Marker::Substring(s) => lower.contains(s.as_str()),
            Marker::Words(w) => words.windows(w.len()).any(|win| win == w.as_slice()),
        })
    }
}

impl Default for TemporalMarkers {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPORAL_MARKERS)
    }
}

/// Lowercased words of a column name, split on non-alphanumerics and lower-to-upper humps.
fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in name.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Output header: canonical names of mapped header columns, in header order, each listed once.
pub fn output_header(header: &[String], mapping: &ColumnMapping) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in header {
        if let Some(canonical) = mapping.get(name) {
            if !out.iter().any(|c| c == canonical) {
                out.push(canonical.to_string());
            }
        }
    }
    out
}

/// Renames and normalizes data rows against a pruned mapping.
#[derive(Debug)]
pub struct RowNormalizer<'a> {
    header: &'a [String],
    mapping: &'a ColumnMapping,
    markers: &'a TemporalMarkers,
    output_header: Vec<String>,
}

impl<'a> RowNormalizer<'a> {
    pub fn new(header: &'a [String], mapping: &'a ColumnMapping, markers: &'a TemporalMarkers) -> Self {
        Self {
            header,
            mapping,
            markers,
            output_header: output_header(header, mapping),
        }
    }

    pub fn output_header(&self) -> &[String] {
        &self.output_header
    }

    pub fn into_output_header(self) -> Vec<String> {
        self.output_header
    }

    /// Canonical name -> value for the mapped cells of `row`.
    ///
    /// Cells past the header's width are skipped. Values of temporal columns are reformatted
    /// when they parse as dates and passed through otherwise. When several source columns feed
    /// one canonical name the rightmost non-empty value wins.
    pub fn map_row(&self, row: &[String]) -> HashMap<&'a str, String> {
        let mut mapped: HashMap<&'a str, String> = HashMap::new();
        for (idx, raw) in row.iter().enumerate() {
            let Some(source) = self.header.get(idx) else { continue };
            let Some(canonical) = self.mapping.get(source) else { continue };

            let value = if self.markers.matches(canonical) {
                dates::reformat_or_raw(raw)
            } else {
                raw.clone()
            };
            match mapped.get(canonical) {
                Some(existing) if value.is_empty() && !existing.is_empty() => {}
                _ => {
                    mapped.insert(canonical, value);
                }
            }
        }
        mapped
    }

    /// Normalize one row into output-header order.
    ///
    /// Returns `None` when the row maps to no columns or only to empty values. Canonical
    /// columns missing from a short row are filled with an empty string.
    pub fn normalize(&self, row: &[String]) -> Option<Vec<String>> {
        let mut mapped = self.map_row(row);
        if mapped.values().all(String::is_empty) {
            return None;
        }
        Some(
            self.output_header
                .iter()
                .map(|c| mapped.remove(c.as_str()).unwrap_or_default())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn mapping() -> ColumnMapping {
        [("姓名", "name"), ("更新时间", "updated_at")].into_iter().collect()
    }

    #[test]
    fn renames_and_reformats_temporal_columns() {
        let header = strings(&["姓名", "更新时间"]);
        let m = mapping();
        let markers = TemporalMarkers::default();
        let n = RowNormalizer::new(&header, &m, &markers);
        assert_eq!(n.output_header(), &["name", "updated_at"]);
        assert_eq!(
            n.normalize(&strings(&["Alice", "2024年01月02日03时04分05秒"])),
            Some(strings(&["Alice", "2024-01-02 03:04:05"]))
        );
    }

    #[test]
    fn non_temporal_values_are_untouched() {
        let header = strings(&["姓名"]);
        let m = mapping();
        let markers = TemporalMarkers::default();
        let n = RowNormalizer::new(&header, &m, &markers);
        assert_eq!(n.normalize(&strings(&["20240102"])), Some(strings(&["20240102"])));
    }

    #[test]
    fn short_rows_are_padded() {
        let header = strings(&["姓名", "更新时间"]);
        let m = mapping();
        let markers = TemporalMarkers::default();
        let n = RowNormalizer::new(&header, &m, &markers);
        assert_eq!(n.normalize(&strings(&["Bob"])), Some(strings(&["Bob", ""])));
    }

    #[test]
    fn unmapped_or_blank_rows_are_dropped() {
        let header = strings(&["姓名", "备注"]);
        let m = mapping();
        let markers = TemporalMarkers::default();
        let n = RowNormalizer::new(&header, &m, &markers);
        assert_eq!(n.normalize(&strings(&["", "note"])), None);
        assert_eq!(n.normalize(&[]), None);
    }

    #[test]
    fn extra_cells_are_ignored() {
        let header = strings(&["姓名"]);
        let m = mapping();
        let markers = TemporalMarkers::default();
        let n = RowNormalizer::new(&header, &m, &markers);
        assert_eq!(n.normalize(&strings(&["Ann", "x", "y"])), Some(strings(&["Ann"])));
    }

    #[test]
    fn duplicate_targets_listed_once_and_prefer_non_empty() {
        let header = strings(&["a", "b"]);
        let m: ColumnMapping = [("a", "x"), ("b", "x")].into_iter().collect();
        let markers = TemporalMarkers::default();
        let n = RowNormalizer::new(&header, &m, &markers);
        assert_eq!(n.output_header(), &["x"]);
        assert_eq!(n.normalize(&strings(&["1", ""])), Some(strings(&["1"])));
        assert_eq!(n.normalize(&strings(&["1", "2"])), Some(strings(&["2"])));
    }

    #[test]
    fn marker_match_is_case_insensitive() {
        let markers = TemporalMarkers::default();
        assert!(markers.matches("Created_At"));
        assert!(markers.matches("updatedAt"));
        assert!(markers.matches("start_time"));
        assert!(markers.matches("birth-date"));
        assert!(markers.matches("更新时间"));
        assert!(!markers.matches("name"));
    }

    #[test]
    fn ascii_markers_match_whole_words_only() {
        let markers = TemporalMarkers::default();
        for name in ["candidate_id", "validated_by", "runtime_ms", "data_attr", "batch_no", "update"] {
            assert!(!markers.matches(name), "{name} should not be temporal");
        }
    }

    #[test]
    fn multi_word_and_padded_markers() {
        let markers = TemporalMarkers::new(["_at", "valid until"]);
        assert!(markers.matches("deleted_at"));
        assert!(markers.matches("validUntil"));
        assert!(!markers.matches("valid_from"));
        assert!(!TemporalMarkers::new(["", "  "]).matches("anything"));
    }

    #[test]
    fn ids_in_non_temporal_columns_are_not_read_as_timestamps() {
        let header = strings(&["候选人编号", "批次"]);
        let m: ColumnMapping = [("候选人编号", "candidate_id"), ("批次", "batch_no")]
            .into_iter()
            .collect();
        let markers = TemporalMarkers::default();
        let n = RowNormalizer::new(&header, &m, &markers);
        assert_eq!(
            n.normalize(&strings(&["1234567890", "20240102"])),
            Some(strings(&["1234567890", "20240102"]))
        );
    }
}
