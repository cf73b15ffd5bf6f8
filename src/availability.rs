use log::debug;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::calendar::AcademicSpan;
use crate::data::{RawGrid, SlotKey, StudentName};
use crate::marker::Marker;

/// Which slots each student can attend.
///
/// Built independently of the calendar rules; the engine only ever asks about
/// capacity-bearing slots.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityIndex {
    slots: HashMap<StudentName, HashSet<SlotKey>>,
}

impl AvailabilityIndex {
    pub fn build(grids: &BTreeMap<StudentName, RawGrid>, span: AcademicSpan) -> Self {
        let mut slots: HashMap<StudentName, HashSet<SlotKey>> = HashMap::new();

        for (name, grid) in grids {
            let available = slots.entry(name.trim().to_string()).or_default();
            for (key, text) in grid.cells(span) {
                if !span.contains(key.date) {
                    continue;
                }
                // a later column for the same date overrides an earlier one
                if Marker::student(text).is_available() {
                    available.insert(key);
                } else {
                    available.remove(&key);
                }
            }
            debug!("student {name}: available in {} slots", available.len());
        }

        Self { slots }
    }

    pub fn is_available(&self, student: &str, key: SlotKey) -> bool {
        self.slots
            .get(student)
            .is_some_and(|set| set.contains(&key))
    }
}
