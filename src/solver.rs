use log::{info, trace, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

use crate::availability::AvailabilityIndex;
use crate::calendar::AcademicSpan;
use crate::config::{EngineConfig, ScoringWeights};
use crate::data::{Entry, SchedulingInput, SchedulingOutput, SlotKey, Subject, Termination};
use crate::demand::{DemandModel, build_demand};
use crate::merge;
use crate::report;
use crate::state::ScheduleState;
use crate::supply::build_supply;
use crate::error::Result;

/// Source of the random tie-break added to every score.
///
/// Draws happen in a fixed order: once per non-full slot in the current slot
/// order, then once per qualifying candidate (demand-table order) for each
/// slot tried. Identical output across implementations needs the same
/// generator, not just the same seed.
pub trait TieBreak {
    /// A value in `[0, 1)`.
    fn draw(&mut self) -> f64;
}

impl TieBreak for ChaCha8Rng {
    fn draw(&mut self) -> f64 {
        self.random::<f64>()
    }
}

pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Final state of an engine run.
#[derive(Debug, Clone)]
pub struct EngineRun {
    pub state: ScheduleState,
    pub students: DemandModel,
    pub termination: Termination,
    pub iterations: u32,
    pub assignments: u32,
}

/// Greedy scheduler: one assignment per full rescan of the slots.
pub struct Engine<'a, T: TieBreak> {
    config: &'a EngineConfig,
    availability: &'a AvailabilityIndex,
    students: DemandModel,
    state: ScheduleState,
    order: Vec<SlotKey>,
    rng: T,
}

fn slot_score(state: &ScheduleState, weights: &ScoringWeights, key: SlotKey) -> Option<f64> {
    let slot = state.slot(key)?;
    if slot.is_full() {
        return None;
    }
    let mut score = 0.0;
    if state.is_occupied(key.prev()) {
        score += weights.slot_adjacency;
    }
    if state.is_occupied(key.next()) {
        score += weights.slot_adjacency;
    }
    // fill the second seat of a pair before opening new slots
    if slot.entries.len() == 1 && slot.capacity.limit() == 2 {
        score += weights.half_pair;
    }
    score += weights.date_concentration * state.date_usage(key.date) as f64;
    Some(score)
}

impl<'a, T: TieBreak> Engine<'a, T> {
    pub fn new(
        config: &'a EngineConfig,
        availability: &'a AvailabilityIndex,
        students: DemandModel,
        state: ScheduleState,
        rng: T,
    ) -> Self {
        let order = state.schedule.keys().copied().collect();
        Self {
            config,
            availability,
            students,
            state,
            order,
            rng,
        }
    }

    pub fn run(mut self) -> EngineRun {
        let mut iterations = 0;
        let mut assignments = 0;

        let termination = loop {
            if iterations >= self.config.max_iterations {
                warn!(
                    "Stopped after {} iterations with assignments still possible",
                    iterations
                );
                break Termination::IterationCap;
            }
            iterations += 1;
            if !self.step() {
                break Termination::Exhausted;
            }
            assignments += 1;
        };

        EngineRun {
            state: self.state,
            students: self.students,
            termination,
            iterations,
            assignments,
        }
    }

    /// Re-sorts the slots by score. Full slots take no draw and sink to the end.
    fn rank_slots(&mut self) -> Vec<(f64, SlotKey)> {
        let mut scored = Vec::with_capacity(self.order.len());
        for &key in &self.order {
            let score = match slot_score(&self.state, &self.config.weights, key) {
                Some(score) => score + self.rng.draw(),
                None => f64::NEG_INFINITY,
            };
            scored.push((score, key));
        }
        // stable, so equal scores keep the previous order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        self.order = scored.iter().map(|&(_, key)| key).collect();
        scored
    }

    fn best_candidate(&mut self, key: SlotKey) -> Option<usize> {
        let weights = &self.config.weights;
        let slot = self.state.slot(key)?;
        let mut best: Option<(f64, usize)> = None;

        for (i, student) in self.students.iter().enumerate() {
            if student.remaining == 0 {
                continue;
            }
            let daily = self.state.daily_usage(&student.name, key.date);
            if daily >= self.config.daily_limit {
                continue;
            }
            if !self.availability.is_available(&student.name, key) {
                continue;
            }
            if slot.contains(&student.name) {
                continue;
            }

            let mut score = weights.student_continuity
                * self.state.neighbour_count(&student.name, key) as f64;
            if daily > 0 {
                score += weights.same_day;
            }
            score += weights.remaining_demand * student.remaining as f64;
            score += self.rng.draw();

            if best.is_none_or(|(b, _)| score > b) {
                best = Some((score, i));
            }
        }
        best.map(|(_, i)| i)
    }

    /// Makes at most one assignment. Returns false when nothing could be placed.
    fn step(&mut self) -> bool {
        for (score, key) in self.rank_slots() {
            if score == f64::NEG_INFINITY {
                break;
            }
            let Some(i) = self.best_candidate(key) else {
                continue;
            };
            let Some(subject) = self.students[i].next_subject() else {
                continue;
            };
            if self.commit(key, i, subject) {
                return true;
            }
        }
        false
    }

    fn commit(&mut self, key: SlotKey, i: usize, subject: Subject) -> bool {
        let student = &mut self.students[i];
        if !self.state.place(key, Entry::new(&student.name, subject.label())) {
            return false;
        }
        student.consume(subject);
        trace!(
            "{key}: {}({}), {} left",
            student.name, subject, student.remaining
        );
        true
    }
}

/// Runs one complete scheduling pass over `input`.
pub fn solve(input: &SchedulingInput) -> Result<SchedulingOutput> {
    let start_time = Instant::now();
    let config = input.config.clone().unwrap_or_default();
    config.validate()?;
    let span = AcademicSpan::new(config.academic_year);

    let supply = build_supply(&input.teacher, span);
    let students = build_demand(&input.demand);
    let availability = AvailabilityIndex::build(&input.student_grids, span);

    let mut state = ScheduleState::empty(&supply);
    let prior = input.prior();
    let stats = if prior.is_empty() {
        merge::MergeStats::default()
    } else {
        merge::seed(&mut state, &prior)
    };

    info!(
        "Setting up greedy run with {} students, {} slots and {} units of demand...",
        students.len(),
        supply.len(),
        students.iter().map(|s| u64::from(s.remaining)).sum::<u64>()
    );

    let engine = Engine::new(&config, &availability, students, state, seeded_rng(config.seed));
    let run = engine.run();

    let duration = start_time.elapsed();
    info!(
        "Run finished: {:?} after {} iterations, {} assignments ({} entries total) in {:.2?}",
        run.termination,
        run.iterations,
        run.assignments,
        run.state.total_entries(),
        duration
    );

    Ok(report::build_output(&run, stats.seeded, config.academic_year))
}
