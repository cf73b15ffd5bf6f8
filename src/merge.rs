use log::{debug, info, warn};

use crate::data::{Entry, PriorSchedule};
use crate::state::ScheduleState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub seeded: u32,
    pub dropped_slots: u32,
    pub dropped_entries: u32,
}

/// Seeds `state` with the entries of a previous run.
///
/// Slots that are no longer capacity-bearing are dropped, as are entries past
/// the slot's current capacity. Demand and availability are not consulted.
pub fn seed(state: &mut ScheduleState, prior: &PriorSchedule) -> MergeStats {
    let mut stats = MergeStats::default();

    for (&key, entries) in prior {
        if state.slot(key).is_none() {
            debug!("{key}: no longer capacity-bearing, dropping {} entries", entries.len());
            stats.dropped_slots += 1;
            continue;
        }
        for text in entries.iter().filter(|t| !t.trim().is_empty()) {
            if state.place(key, Entry::parse(text)) {
                stats.seeded += 1;
            } else {
                warn!("{key}: {text} exceeds the slot's capacity, dropping");
                stats.dropped_entries += 1;
            }
        }
    }

    info!(
        "seeded {} entries from prior schedule ({} stale slots, {} over capacity)",
        stats.seeded, stats.dropped_slots, stats.dropped_entries
    );
    stats
}
