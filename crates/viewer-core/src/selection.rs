//! Multi-select state over the record list.
//!
//! Selection flags live on the records themselves. This module tracks the
//! two derived positions: the active record (the one being displayed) and the
//! anchor that range gestures extend from.

use gribview_common::FieldRecord;

/// Direction of a keyboard step through the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Up,
    Down,
}

/// How a click on a row combines with the existing selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickMode {
    /// Plain click: select only this row
    #[default]
    Single,
    /// Shift-click: select from the anchor to this row
    Range,
    /// Ctrl-click: flip this row
    Toggle,
}

/// Active and anchor positions. Both are 0-based list positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    active: Option<usize>,
    anchor: Option<usize>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    /// Forget both positions.
    pub fn reset(&mut self) {
        self.active = None;
        self.anchor = None;
    }

    /// Drop the anchor; the next range gesture starts from the active record.
    pub fn invalidate_anchor(&mut self) {
        self.anchor = None;
    }

    /// Set the anchor explicitly (after a sort, the active record).
    pub fn set_anchor(&mut self, anchor: Option<usize>) {
        self.anchor = anchor;
    }

    /// Select only `position`, which becomes active and anchor.
    pub fn single_select(&mut self, records: &mut [FieldRecord], position: usize) -> Option<usize> {
        if position >= records.len() {
            return self.refresh(records, None);
        }
        for (i, record) in records.iter_mut().enumerate() {
            record.selected = i == position;
        }
        self.active = Some(position);
        self.anchor = Some(position);
        self.active
    }

    /// Flip one record's flag.
    ///
    /// A newly selected record becomes the anchor. The active record is the
    /// first selected one afterwards; with nothing selected the anchor goes too.
    pub fn toggle(&mut self, records: &mut [FieldRecord], position: usize) -> Option<usize> {
        let Some(record) = records.get_mut(position) else {
            return self.refresh(records, None);
        };
        record.selected = !record.selected;
        if record.selected {
            self.anchor = Some(position);
        }

        let active = self.refresh(records, None);
        if active.is_none() {
            self.anchor = None;
        }
        active
    }

    /// Select everything between the anchor and `position`, inclusive.
    ///
    /// Without an anchor, the active record (or `position` itself) is used
    /// and becomes the anchor.
    pub fn range_select(&mut self, records: &mut [FieldRecord], position: usize) -> Option<usize> {
        if records.is_empty() {
            return self.refresh(records, None);
        }
        let position = position.min(records.len() - 1);
        let anchor = self
            .anchor
            .or(self.active)
            .filter(|a| *a < records.len())
            .unwrap_or(position);
        self.anchor = Some(anchor);

        let (lo, hi) = if anchor <= position {
            (anchor, position)
        } else {
            (position, anchor)
        };
        for (i, record) in records.iter_mut().enumerate() {
            record.selected = (lo..=hi).contains(&i);
        }
        self.refresh(records, Some(position))
    }

    /// Apply a click on a row.
    pub fn click(&mut self, records: &mut [FieldRecord], position: usize, mode: ClickMode) -> Option<usize> {
        match mode {
            ClickMode::Single => self.single_select(records, position),
            ClickMode::Range => self.range_select(records, position),
            ClickMode::Toggle => self.toggle(records, position),
        }
    }

    /// Move the active record one row, clamped to the list.
    ///
    /// Moving down with nothing active lands on the first row. With `extend`
    /// the selection grows from the anchor instead of being replaced.
    pub fn step(
        &mut self,
        records: &mut [FieldRecord],
        direction: StepDirection,
        extend: bool,
    ) -> Option<usize> {
        if records.is_empty() {
            return self.refresh(records, None);
        }
        let last = records.len() - 1;
        let current = self.active.unwrap_or(0).min(last);
        let next = match (direction, self.active) {
            (StepDirection::Up, _) => current.saturating_sub(1),
            (StepDirection::Down, None) => 0,
            (StepDirection::Down, Some(_)) => (current + 1).min(last),
        };

        if extend {
            if self.anchor.is_none() {
                self.anchor = Some(current);
            }
            self.range_select(records, next)
        } else {
            self.single_select(records, next)
        }
    }

    /// Recompute the active record from the flags.
    ///
    /// Prefers `preferred` while it is selected, then the first selected
    /// record. A stale anchor past the end of the list is dropped.
    pub fn refresh(&mut self, records: &[FieldRecord], preferred: Option<usize>) -> Option<usize> {
        let is_selected = |p: usize| records.get(p).map(|r| r.selected).unwrap_or(false);

        self.active = preferred
            .filter(|p| is_selected(*p))
            .or_else(|| records.iter().position(|r| r.selected));

        if self.anchor.is_some_and(|a| a >= records.len()) {
            self.anchor = None;
        }
        self.active
    }
}
