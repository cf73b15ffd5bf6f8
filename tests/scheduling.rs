use chrono::NaiveDate;
use lesson_scheduler::calendar::{AcademicSpan, open_periods};
use lesson_scheduler::data::{
    DemandRow, PriorSlot, RawColumn, RawGrid, SchedulingInput, Subject, Termination,
};
use lesson_scheduler::report::{read_prior_schedule, write_workbook};
use lesson_scheduler::solve;
use serde_json::json;
use std::collections::HashMap;

const STUDENTS: [&str; 5] = ["山田くん", "田中さん", "高橋くん", "鈴木さん", "伊藤くん"];

/// Teacher is in every open period, half days on Saturdays.
fn teacher_grid(span: AcademicSpan) -> RawGrid {
    let columns = span
        .dates()
        .map(|date| {
            let open = open_periods(date);
            let partial = open == [2, 3, 4, 5];
            RawColumn {
                label: date.format("%m/%d(%a)").to_string(),
                cells: (1..=6)
                    .map(|p| match (open.contains(&p), partial) {
                        (true, true) => "△",
                        (true, false) => "〇",
                        (false, _) => "×",
                    })
                    .map(String::from)
                    .collect(),
            }
        })
        .collect();
    RawGrid { columns }
}

/// Each student skips a different weekday-ish stripe of dates.
fn student_grid(span: AcademicSpan, index: usize) -> RawGrid {
    let columns = span
        .dates()
        .enumerate()
        .map(|(i, date)| RawColumn {
            label: date.format("%m/%d").to_string(),
            cells: (0..6)
                .map(|p| (if (i + p + index) % 3 == 0 { "×" } else { "〇" }).to_string())
                .collect(),
        })
        .collect();
    RawGrid { columns }
}

fn input() -> SchedulingInput {
    let span = AcademicSpan::new(2025);
    let demand = STUDENTS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            serde_json::from_value::<DemandRow>(json!({
                "name": name,
                "国語": i % 3,
                "数学": 4 + i,
                "英語": 6 - i,
                "理科": 2,
                "社会": i,
            }))
            .unwrap()
        })
        .collect();
    SchedulingInput {
        teacher_name: "佐藤".to_string(),
        teacher: teacher_grid(span),
        demand,
        student_grids: STUDENTS
            .iter()
            .enumerate()
            .map(|(i, n)| (n.to_string(), student_grid(span, i)))
            .collect(),
        ..SchedulingInput::default()
    }
}

#[test]
fn capacity_and_daily_limits_hold() {
    let output = solve(&input()).unwrap();
    let mut per_day: HashMap<(String, NaiveDate), usize> = HashMap::new();

    for slot in &output.slots {
        assert!(slot.entries.len() <= slot.capacity.limit(), "{slot:?}");
        assert!(open_periods(slot.date).contains(&slot.period));
        let mut seen = Vec::new();
        for entry in &slot.entries {
            let name = entry.split('(').next().unwrap().to_string();
            assert!(!seen.contains(&name), "{name} twice in {slot:?}");
            seen.push(name.clone());
            *per_day.entry((name, slot.date)).or_default() += 1;
        }
    }
    assert!(per_day.values().all(|&n| n <= 3));
    assert_eq!(output.termination, Termination::Exhausted);
}

#[test]
fn demand_never_goes_negative_or_up() {
    let input = input();
    let output = solve(&input).unwrap();
    let total_demand: u32 = (0..STUDENTS.len())
        .map(|i| (i % 3 + 4 + i + 6 - i + 2 + i) as u32)
        .sum();
    let shortfall: u32 = output.unscheduled.iter().map(|u| u.shortfall).sum();
    assert_eq!(output.assignments_made + shortfall, total_demand);

    for record in &output.unscheduled {
        let placed = output
            .slots
            .iter()
            .flat_map(|s| &s.entries)
            .filter(|e| **e == format!("{}({})", record.student, record.subject.label()))
            .count() as u32;
        let i = STUDENTS.iter().position(|n| *n == record.student).unwrap();
        let requested = match record.subject {
            Subject::Japanese => i % 3,
            Subject::Math => 4 + i,
            Subject::English => 6 - i,
            Subject::Science => 2,
            Subject::Social => i,
        } as u32;
        assert_eq!(placed + record.shortfall, requested);
    }
}

#[test]
fn identical_inputs_give_identical_schedules() {
    let a = solve(&input()).unwrap();
    let b = solve(&input()).unwrap();
    assert_eq!(a.slots, b.slots);
    assert_eq!(a.unscheduled, b.unscheduled);
}

#[test]
fn exported_schedule_seeds_the_next_run() {
    let first = solve(&input()).unwrap();
    let bytes = write_workbook(&first).unwrap();
    let prior = read_prior_schedule(&bytes, AcademicSpan::new(2025)).unwrap();

    let expected: usize = first.slots.iter().map(|s| s.entries.len()).sum();
    assert_eq!(prior.values().map(Vec::len).sum::<usize>(), expected);

    let mut next = input();
    next.demand.iter_mut().for_each(|row| row.counts.clear());
    next.prior_schedule = prior
        .into_iter()
        .map(|(key, entries)| PriorSlot {
            date: key.date,
            period: key.period,
            entries,
        })
        .collect();
    let second = solve(&next).unwrap();
    assert_eq!(second.seeded_entries as usize, expected);
    assert_eq!(second.assignments_made, 0);
    assert_eq!(second.slots, first.slots);
}

#[test]
fn seeded_slots_that_closed_are_dropped() {
    let mut input = input();
    input.demand.iter_mut().for_each(|row| row.counts.clear());
    input.prior_schedule = vec![
        PriorSlot {
            date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            period: 4,
            entries: vec!["山田くん(数学)".to_string()],
        },
        PriorSlot {
            date: NaiveDate::from_ymd_opt(2025, 12, 2).unwrap(),
            period: 4,
            entries: vec!["山田くん(数学)".to_string()],
        },
    ];
    let output = solve(&input).unwrap();
    assert_eq!(output.seeded_entries, 1);
    assert!(output.slots.iter().all(|s| s.date != input.prior_schedule[0].date));
}

#[test]
fn oversized_requests_are_capped_not_fatal() {
    let mut input = input();
    let row = json!({"name": "山田くん", "数学": 4294967295u64, "英語": 4294967295u64});
    input.demand = vec![serde_json::from_value(row).unwrap()];
    let output = solve(&input).unwrap();
    let shortfall: u32 = output.unscheduled.iter().map(|u| u.shortfall).sum();
    assert_eq!(output.assignments_made + shortfall, 2 * 10_000);
}
