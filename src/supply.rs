use log::{debug, trace};
use std::collections::BTreeMap;

use crate::calendar::{AcademicSpan, is_open};
use crate::data::{Capacity, RawGrid, SlotKey};
use crate::marker::Marker;

/// Teacher capacity per capacity-bearing slot.
pub type SupplyModel = BTreeMap<SlotKey, Capacity>;

/// Derives slot capacity from the teacher grid.
///
/// Only periods open on the cell's date are examined; cells that classify to
/// neither full nor partial leave the slot out entirely.
pub fn build_supply(grid: &RawGrid, span: AcademicSpan) -> SupplyModel {
    let mut supply = SupplyModel::new();
    let mut skipped = 0usize;

    for (key, text) in grid.cells(span) {
        if !is_open(key.date, key.period) {
            continue;
        }
        match Marker::teacher(text).capacity() {
            Some(capacity) => {
                trace!("{key}: capacity {capacity:?}");
                supply.insert(key, capacity);
            }
            None => skipped += 1,
        }
    }

    debug!(
        "teacher grid: {} capacity-bearing slots, {} open cells without capacity",
        supply.len(),
        skipped
    );
    supply
}
