use chrono::NaiveDate;
use std::collections::HashMap;

use crate::data::{Entry, ScheduleMap, ScheduleSlot, SlotKey};
use crate::supply::SupplyModel;

/// Mutable schedule of one run plus the usage counters derived from it.
#[derive(Debug, Clone, Default)]
pub struct ScheduleState {
    pub schedule: ScheduleMap,
    date_usage: HashMap<NaiveDate, u32>,
    daily_usage: HashMap<(String, NaiveDate), u32>,
}

impl ScheduleState {
    /// One empty slot per capacity-bearing cell.
    pub fn empty(supply: &SupplyModel) -> Self {
        Self {
            schedule: supply
                .iter()
                .map(|(&key, &capacity)| (key, ScheduleSlot::new(capacity)))
                .collect(),
            ..Self::default()
        }
    }

    pub fn slot(&self, key: SlotKey) -> Option<&ScheduleSlot> {
        self.schedule.get(&key)
    }

    pub fn is_occupied(&self, key: Option<SlotKey>) -> bool {
        key.and_then(|k| self.slot(k))
            .is_some_and(|slot| !slot.entries.is_empty())
    }

    pub fn date_usage(&self, date: NaiveDate) -> u32 {
        self.date_usage.get(&date).copied().unwrap_or(0)
    }

    pub fn daily_usage(&self, student: &str, date: NaiveDate) -> u32 {
        self.daily_usage
            .get(&(student.to_string(), date))
            .copied()
            .unwrap_or(0)
    }

    /// The student's own entries in the periods right before and after `key`.
    pub fn neighbour_count(&self, student: &str, key: SlotKey) -> usize {
        [key.prev(), key.next()]
            .into_iter()
            .flatten()
            .filter_map(|k| self.slot(k))
            .map(|slot| slot.count_of(student))
            .sum()
    }

    /// Appends `entry` to the slot at `key` and bumps both counters.
    /// Returns false when the slot does not exist or is already full.
    pub fn place(&mut self, key: SlotKey, entry: Entry) -> bool {
        let Some(slot) = self.schedule.get_mut(&key) else {
            return false;
        };
        if slot.is_full() {
            return false;
        }
        *self.date_usage.entry(key.date).or_default() += 1;
        *self
            .daily_usage
            .entry((entry.student.clone(), key.date))
            .or_default() += 1;
        slot.entries.push(entry);
        true
    }

    pub fn total_entries(&self) -> usize {
        self.schedule.values().map(|s| s.entries.len()).sum()
    }
}
