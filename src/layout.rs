//! # Layout Module
//!
//! Arranges an ordered list of buttons into keyboard rows.
//!
//! Row sizes come from an optional *formation* (explicit sizes consumed in
//! order) and fall back to `max_per_row` once the formation is exhausted.
//! Buttons may force a row break before or after themselves; a forced break
//! ends the current row early without consuming a formation slot.

use crate::config::DEFAULT_MAX_PER_ROW;

/// Row-break flags attached to a button
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ButtonOptions {
    pub break_before: bool,
    pub break_after: bool,
}

impl ButtonOptions {
    pub fn new(break_before: bool, break_after: bool) -> Self {
        Self {
            break_before,
            break_after,
        }
    }

    pub fn break_before() -> Self {
        Self::new(true, false)
    }

    pub fn break_after() -> Self {
        Self::new(false, true)
    }
}

/// Row-size policy of a keyboard
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowPolicy {
    /// Row size once the formation is exhausted; `None` or 0 means the default
    pub max_per_row: Option<usize>,
    /// Explicit row sizes, consumed in order
    pub formation: Vec<usize>,
}

impl RowPolicy {
    pub fn new(max_per_row: Option<usize>, formation: Vec<usize>) -> Self {
        Self {
            max_per_row,
            formation,
        }
    }

    /// Capacity of the row started after `filled_rows` rows reached capacity
    fn capacity(&self, filled_rows: usize, fallback: usize) -> usize {
        let fallback = match self.max_per_row {
            Some(max) if max > 0 => max,
            _ => fallback,
        };

        match self.formation.get(filled_rows) {
            Some(&size) if size > 0 => size,
            _ => fallback,
        }
    }
}

enum Slot<T> {
    Button(T),
    Break,
}

/// Arrange buttons into rows using the default fallback row size
pub fn arrange<T>(buttons: Vec<(T, ButtonOptions)>, policy: &RowPolicy) -> Vec<Vec<T>> {
    arrange_with_fallback(buttons, policy, DEFAULT_MAX_PER_ROW)
}

/// Arrange buttons into rows
///
/// `fallback` is used when the policy sets no `max_per_row`. Every button
/// appears exactly once, in input order; empty rows are never produced and a
/// final partial row is kept as is.
pub fn arrange_with_fallback<T>(
    buttons: Vec<(T, ButtonOptions)>,
    policy: &RowPolicy,
    fallback: usize,
) -> Vec<Vec<T>> {
    let fallback = fallback.max(1);

    let mut slots = Vec::with_capacity(buttons.len());
    for (button, options) in buttons {
        if options.break_before {
            slots.push(Slot::Break);
        }
        slots.push(Slot::Button(button));
        if options.break_after {
            slots.push(Slot::Break);
        }
    }

    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut filled_rows = 0;

    for slot in slots {
        match slot {
            Slot::Break => {
                if !row.is_empty() {
                    rows.push(std::mem::take(&mut row));
                }
            }
            Slot::Button(button) => {
                row.push(button);
                if row.len() >= policy.capacity(filled_rows, fallback) {
                    rows.push(std::mem::take(&mut row));
                    filled_rows += 1;
                }
            }
        }
    }

    if !row.is_empty() {
        rows.push(row);
    }

    rows
}
