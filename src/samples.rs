//! Ordered sample (vial) list: CRUD, range generation, CSV import/export.
//!
//! Pure in-memory glue around the capture core. Selecting an entry is what
//! drives `NamingSubject::select_subject`; the list itself owns no naming or
//! scheduling logic.

use crate::error::ImcapResult;
use std::path::Path;

/// Ordered, duplicate-free list of sample identifiers with a selection
/// cursor.
#[derive(Debug, Default)]
pub struct SampleList {
    items: Vec<String>,
    selected: Option<usize>,
}

impl SampleList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append `id` unless it is already present; reports whether it was added.
    pub fn add_unique(&mut self, id: &str) -> bool {
        if id.is_empty() || self.items.iter().any(|existing| existing == id) {
            return false;
        }
        self.items.push(id.to_string());
        true
    }

    /// Remove `id`; reports whether it was present. Clears the selection if
    /// the selected entry is removed.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.items.iter().position(|existing| existing == id) {
            Some(index) => {
                self.items.remove(index);
                match self.selected {
                    Some(sel) if sel == index => self.selected = None,
                    Some(sel) if sel > index => self.selected = Some(sel - 1),
                    _ => {}
                }
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.selected = None;
    }

    /// Select by index; returns the selected identifier.
    pub fn select(&mut self, index: usize) -> Option<&str> {
        if index < self.items.len() {
            self.selected = Some(index);
            self.items.get(index).map(String::as_str)
        } else {
            None
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected
            .and_then(|index| self.items.get(index))
            .map(String::as_str)
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Move the selection forward; returns the newly selected identifier.
    pub fn select_next(&mut self) -> Option<&str> {
        let next = match self.selected {
            Some(index) => index + 1,
            None => 0,
        };
        self.select(next)
    }

    /// Move the selection backward; returns the newly selected identifier.
    pub fn select_prev(&mut self) -> Option<&str> {
        match self.selected {
            Some(index) if index > 0 => self.select(index - 1),
            _ => None,
        }
    }

    /// Add `prefix` + zero-padded ids over `low..=high`; returns how many
    /// were new.
    pub fn extend_from_range(&mut self, prefix: &str, low: u32, high: u32) -> usize {
        let mut added = 0;
        for i in low..=high {
            if self.add_unique(&format!("{prefix}{i:03}")) {
                added += 1;
            }
        }
        added
    }

    /// Import identifiers from a single-column CSV, skipping a `vial`/`id`
    /// header row when present; returns how many were new.
    pub fn import_csv(&mut self, path: &Path) -> ImcapResult<usize> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let mut added = 0;
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let Some(field) = record.get(0) else { continue };
            let field = field.trim();
            if row == 0 {
                let lower = field.to_lowercase();
                if lower.starts_with("vial") || lower.starts_with("id") {
                    continue;
                }
            }
            if self.add_unique(field) {
                added += 1;
            }
        }
        tracing::info!(path = %path.display(), added, "sample list imported");
        Ok(added)
    }

    /// Export the list as a single-column CSV with an `ID` header row.
    pub fn export_csv(&self, path: &Path) -> ImcapResult<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["ID"])?;
        for item in &self.items {
            writer.write_record([item.as_str()])?;
        }
        writer.flush()?;
        tracing::info!(path = %path.display(), count = self.items.len(), "sample list exported");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn add_unique_rejects_duplicates_and_empty() {
        let mut list = SampleList::new();
        assert!(list.add_unique("vial3A001"));
        assert!(!list.add_unique("vial3A001"));
        assert!(!list.add_unique(""));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn range_generation_is_zero_padded() {
        let mut list = SampleList::new();
        assert_eq!(list.extend_from_range("3A", 1, 3), 3);
        assert_eq!(list.items(), &["3A001", "3A002", "3A003"]);

        // Re-generating the same range adds nothing.
        assert_eq!(list.extend_from_range("3A", 1, 3), 0);
    }

    #[test]
    fn selection_cursor_walks_the_list() {
        let mut list = SampleList::new();
        list.extend_from_range("v", 1, 3);

        assert_eq!(list.select_next(), Some("v001"));
        assert_eq!(list.select_next(), Some("v002"));
        assert_eq!(list.select_prev(), Some("v001"));
        assert_eq!(list.select_prev(), None);
        assert_eq!(list.selected(), Some("v001"));

        list.deselect();
        assert_eq!(list.selected(), None);
    }

    #[test]
    fn removing_the_selected_entry_clears_the_selection() {
        let mut list = SampleList::new();
        list.extend_from_range("v", 1, 2);
        list.select(1);

        assert!(list.remove("v002"));
        assert_eq!(list.selected(), None);

        list.select(0);
        assert!(!list.remove("missing"));
        assert_eq!(list.selected(), Some("v001"));
    }

    #[test]
    fn csv_round_trip_skips_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vials.csv");

        let mut list = SampleList::new();
        list.extend_from_range("3A", 1, 2);
        list.export_csv(&path).unwrap();

        let mut imported = SampleList::new();
        assert_eq!(imported.import_csv(&path).unwrap(), 2);
        assert_eq!(imported.items(), list.items());
    }

    #[test]
    fn csv_import_keeps_a_headerless_first_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.csv");
        std::fs::write(&path, "3A001\n3A002\n").unwrap();

        let mut list = SampleList::new();
        assert_eq!(list.import_csv(&path).unwrap(), 2);
        assert_eq!(list.items(), &["3A001", "3A002"]);
    }
}
