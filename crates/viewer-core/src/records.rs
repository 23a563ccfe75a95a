//! The ordered record list and the attribute columns shown for it.

use std::ops::Range;

use gribview_common::{FieldRecord, RecordHeader, RecordId, BULK_KEYS};

/// Ordered list of loaded records.
///
/// Positions are 0-based; each record's `index` is its position plus one and
/// is kept dense through appends, sorts and deletions.
#[derive(Debug, Default)]
pub struct RecordList {
    records: Vec<FieldRecord>,
    next_id: u64,
}

impl RecordList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&FieldRecord> {
        self.records.get(position)
    }

    pub fn get_mut(&mut self, position: usize) -> Option<&mut FieldRecord> {
        self.records.get_mut(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[FieldRecord] {
        &self.records
    }

    pub fn as_mut_slice(&mut self) -> &mut [FieldRecord] {
        &mut self.records
    }

    /// Current position of a record, if it is still loaded.
    pub fn position_of(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    pub fn find(&self, id: RecordId) -> Option<&FieldRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Append records, numbering them after the current last one.
    ///
    /// Returns the positions of the new records.
    pub fn append(&mut self, headers: impl IntoIterator<Item = RecordHeader>) -> Range<usize> {
        let start = self.records.len();
        for header in headers {
            let id = RecordId(self.next_id);
            self.next_id += 1;
            let index = self.records.len() + 1;
            self.records.push(FieldRecord::from_header(id, index, header));
        }
        start..self.records.len()
    }

    /// Drop every record. Ids are not reused.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Stable sort on one attribute, numbers compared as numbers.
    pub fn sort_by_column(&mut self, key: &str, ascending: bool) {
        self.records.sort_by(|a, b| {
            let ordering = a.attributes.compare_by(&b.attributes, key);
            if ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
        self.renumber();
    }

    /// Remove every selected record and renumber the rest.
    ///
    /// Returns how many were removed.
    pub fn remove_selected(&mut self) -> usize {
        let before = self.records.len();
        self.records.retain(|r| !r.selected);
        let removed = before - self.records.len();
        if removed > 0 {
            self.renumber();
        }
        removed
    }

    /// Reassign 1-based ordinals in list order.
    pub fn renumber(&mut self) {
        for (position, record) in self.records.iter_mut().enumerate() {
            record.set_index(position + 1);
        }
    }

    /// Positions of selected records, in list order.
    pub fn selected_positions(&self) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.selected)
            .map(|(position, _)| position)
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.records.iter().filter(|r| r.selected).count()
    }

    /// Keys offered as table columns: the first record's keys without
    /// `index` and bulk arrays, sorted.
    pub fn available_columns(&self) -> Vec<String> {
        let Some(first) = self.records.first() else {
            return Vec::new();
        };
        let mut keys: Vec<String> = first
            .attributes
            .keys()
            .filter(|k| *k != "index" && !BULK_KEYS.contains(k))
            .map(String::from)
            .collect();
        keys.sort();
        keys
    }
}

/// Attribute columns displayed in the record table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSet {
    columns: Vec<String>,
}

impl ColumnSet {
    /// Build from configured names; `index` always leads.
    pub fn new<I, T>(columns: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut set = Self {
            columns: vec!["index".to_string()],
        };
        for column in columns {
            let column = column.into();
            if !set.contains(&column) {
                set.columns.push(column);
            }
        }
        set
    }

    pub fn contains(&self, key: &str) -> bool {
        self.columns.iter().any(|c| c == key)
    }

    /// Show or hide a column. `index` cannot be hidden.
    ///
    /// Returns whether the column is displayed afterwards.
    pub fn toggle(&mut self, key: &str) -> bool {
        if key == "index" {
            return true;
        }
        if let Some(position) = self.columns.iter().position(|c| c == key) {
            self.columns.remove(position);
            false
        } else {
            self.columns.push(key.to_string());
            true
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.columns
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Default for ColumnSet {
    fn default() -> Self {
        Self::new(["level", "shortName", "dataDate"])
    }
}
