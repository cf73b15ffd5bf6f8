use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::calendar::{AcademicSpan, date_label, is_open};
use crate::config::EngineConfig;

// Type aliases for clarity
pub type StudentName = String;
pub type Period = u8;

/// All teaching periods of a day, in order.
pub const PERIODS: [Period; 6] = [1, 2, 3, 4, 5, 6];

/// The five fixed subjects of the demand table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Subject {
    Japanese,
    Math,
    English,
    Science,
    Social,
}

impl Subject {
    /// Demand-table column order.
    pub const ALL: [Subject; 5] = [
        Subject::Japanese,
        Subject::Math,
        Subject::English,
        Subject::Science,
        Subject::Social,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Subject::Japanese => "国語",
            Subject::Math => "数学",
            Subject::English => "英語",
            Subject::Science => "理科",
            Subject::Social => "社会",
        }
    }

    /// Accepts either the sheet label or the English name.
    pub fn from_key(key: &str) -> Option<Subject> {
        let key = key.trim();
        Subject::ALL.into_iter().find(|s| {
            s.label() == key || s.english_name().eq_ignore_ascii_case(key)
        })
    }

    fn english_name(self) -> &'static str {
        match self {
            Subject::Japanese => "japanese",
            Subject::Math => "math",
            Subject::English => "english",
            Subject::Science => "science",
            Subject::Social => "social",
        }
    }

    /// Rank used when two subjects have the same remaining count; lower wins.
    /// Matches a descending sort of the labels.
    pub fn tie_rank(self) -> u8 {
        match self {
            Subject::English => 0,
            Subject::Social => 1,
            Subject::Science => 2,
            Subject::Math => 3,
            Subject::Japanese => 4,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A (date, period) cell of the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey {
    pub date: NaiveDate,
    pub period: Period,
}

impl SlotKey {
    pub fn new(date: NaiveDate, period: Period) -> Self {
        Self { date, period }
    }

    pub fn prev(self) -> Option<SlotKey> {
        (self.period > 1).then(|| SlotKey::new(self.date, self.period - 1))
    }

    pub fn next(self) -> Option<SlotKey> {
        (self.period < 6).then(|| SlotKey::new(self.date, self.period + 1))
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} P{}", self.date.format("%m/%d"), self.period)
    }
}

/// How many students the teacher can take in one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capacity {
    Partial,
    Full,
}

impl Capacity {
    pub fn limit(self) -> usize {
        match self {
            Capacity::Partial => 1,
            Capacity::Full => 2,
        }
    }
}

/// One `Student(Subject)` entry in a slot.
///
/// Entries seeded from a prior workbook keep their text verbatim; text without
/// a trailing `(...)` is kept as a bare student name with an empty subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    pub student: StudentName,
    pub subject: String,
}

impl Entry {
    pub fn new(student: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            student: student.into(),
            subject: subject.into(),
        }
    }

    pub fn parse(text: &str) -> Entry {
        let text = text.trim();
        if let Some(body) = text.strip_suffix(')') {
            if let Some(open) = body.rfind('(') {
                // "a()" has no subject to split off and stays whole
                if open + 1 < body.len() {
                    return Entry::new(&body[..open], &body[open + 1..]);
                }
            }
        }
        Entry::new(text, "")
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subject.is_empty() {
            f.write_str(&self.student)
        } else {
            write!(f, "{}({})", self.student, self.subject)
        }
    }
}

/// A capacity-bearing slot and what has been placed in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSlot {
    pub capacity: Capacity,
    pub entries: Vec<Entry>,
}

impl ScheduleSlot {
    pub fn new(capacity: Capacity) -> Self {
        Self {
            capacity,
            entries: Vec::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity.limit()
    }

    pub fn contains(&self, student: &str) -> bool {
        self.entries.iter().any(|e| e.student == student)
    }

    pub fn count_of(&self, student: &str) -> usize {
        self.entries.iter().filter(|e| e.student == student).count()
    }
}

pub type ScheduleMap = BTreeMap<SlotKey, ScheduleSlot>;

/// One week-column of a raw availability grid; `cells[i]` is period `i + 1`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawColumn {
    pub label: String,
    #[serde(default)]
    pub cells: Vec<String>,
}

/// Raw availability grid as captured by the editors.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawGrid {
    #[serde(default)]
    pub columns: Vec<RawColumn>,
}

impl RawGrid {
    /// Yields every cell whose column label resolves to a date.
    /// Unparseable labels are skipped, as are missing cells.
    pub fn cells(&self, span: AcademicSpan) -> impl Iterator<Item = (SlotKey, &str)> {
        self.columns.iter().flat_map(move |col| {
            let date = span.resolve_label(&col.label);
            if date.is_none() {
                debug!("skipping grid column with unreadable label {:?}", col.label);
            }
            date.into_iter().flat_map(move |date| {
                col.cells
                    .iter()
                    .zip(PERIODS)
                    .map(move |(text, period)| (SlotKey::new(date, period), text.as_str()))
            })
        })
    }

    /// A starter grid for `dates`: open periods "〇", closed ones "×".
    pub fn template(dates: &[NaiveDate]) -> RawGrid {
        let columns = dates
            .iter()
            .map(|&date| RawColumn {
                label: date_label(date),
                cells: PERIODS
                    .iter()
                    .map(|&p| (if is_open(date, p) { "〇" } else { "×" }).to_string())
                    .collect(),
            })
            .collect();
        RawGrid { columns }
    }
}

/// One row of the requested-counts table.
///
/// Counts are kept as raw JSON so that blank or textual cells coerce to zero
/// instead of failing the whole request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DemandRow {
    pub name: StudentName,
    #[serde(flatten)]
    pub counts: BTreeMap<String, serde_json::Value>,
}

/// Slot contents of a previously exported schedule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PriorSlot {
    pub date: NaiveDate,
    pub period: Period,
    pub entries: Vec<String>,
}

impl PriorSlot {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.date, self.period)
    }
}

pub type PriorSchedule = BTreeMap<SlotKey, Vec<String>>;

/// The complete input for one scheduling run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingInput {
    #[serde(default)]
    pub teacher_name: String,
    pub teacher: RawGrid,
    pub demand: Vec<DemandRow>,
    #[serde(default)]
    pub student_grids: BTreeMap<StudentName, RawGrid>,
    #[serde(default)]
    pub prior_schedule: Vec<PriorSlot>,
    #[serde(default)]
    pub config: Option<EngineConfig>,
}

impl SchedulingInput {
    pub fn prior(&self) -> PriorSchedule {
        self.prior_schedule
            .iter()
            .map(|s| (s.key(), s.entries.clone()))
            .collect()
    }
}

/// Why the engine loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Termination {
    /// No eligible slot/candidate pairing remained.
    Exhausted,
    /// The iteration fuse tripped while assignments were still possible.
    IterationCap,
}

/// A slot in the final schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledSlot {
    pub date: NaiveDate,
    pub period: Period,
    pub capacity: Capacity,
    pub entries: Vec<String>,
}

/// Demand that could not be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnscheduledDemand {
    pub student: StudentName,
    pub subject: Subject,
    pub shortfall: u32,
}

impl fmt::Display for UnscheduledDemand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {} short", self.student, self.subject, self.shortfall)
    }
}

/// The final output of the solver.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingOutput {
    pub slots: Vec<ScheduledSlot>,
    pub unscheduled: Vec<UnscheduledDemand>,
    pub termination: Termination,
    pub iterations: u32,
    pub assignments_made: u32,
    pub seeded_entries: u32,
    pub academic_year: i32,
}

impl SchedulingOutput {
    pub fn schedule(&self) -> PriorSchedule {
        self.slots
            .iter()
            .map(|s| (SlotKey::new(s.date, s.period), s.entries.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_parses_formatted_text() {
        let e = Entry::parse("山田くん(数学)");
        assert_eq!(e.student, "山田くん");
        assert_eq!(e.subject, "数学");
        assert_eq!(e.to_string(), "山田くん(数学)");
    }

    #[test]
    fn entry_without_subject_is_kept_verbatim() {
        let e = Entry::parse(" 田中 ");
        assert_eq!(e.student, "田中");
        assert_eq!(e.subject, "");
        assert_eq!(e.to_string(), "田中");
    }

    #[test]
    fn empty_parentheses_render_unchanged() {
        for text in ["a()", "(数学)", "b(数学))"] {
            assert_eq!(Entry::parse(text).to_string(), text);
        }
        assert_eq!(Entry::parse("a()").student, "a()");
    }

    #[test]
    fn subject_keys_accept_labels_and_names() {
        assert_eq!(Subject::from_key("英語"), Some(Subject::English));
        assert_eq!(Subject::from_key("Math"), Some(Subject::Math));
        assert_eq!(Subject::from_key("生徒名"), None);
    }

    #[test]
    fn tie_rank_follows_descending_labels() {
        let mut by_label = Subject::ALL.to_vec();
        by_label.sort_by(|a, b| b.label().cmp(a.label()));
        let mut by_rank = Subject::ALL.to_vec();
        by_rank.sort_by_key(|s| s.tie_rank());
        assert_eq!(by_label, by_rank);
    }

    #[test]
    fn grid_cells_skip_bad_labels_and_short_columns() {
        let grid = RawGrid {
            columns: vec![
                RawColumn {
                    label: "12/02(Tue)".to_string(),
                    cells: vec!["×".into(), "×".into(), "〇".into()],
                },
                RawColumn {
                    label: "memo".to_string(),
                    cells: vec!["〇".into(); 6],
                },
            ],
        };
        let cells: Vec<_> = grid.cells(AcademicSpan::new(2025)).collect();
        assert_eq!(cells.len(), 3);
        let d = NaiveDate::from_ymd_opt(2025, 12, 2).unwrap();
        assert_eq!(cells[2], (SlotKey::new(d, 3), "〇"));
    }

    #[test]
    fn template_marks_open_periods() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 6).unwrap();
        let grid = RawGrid::template(&[d]);
        assert_eq!(grid.columns[0].label, "12/06(Sat)");
        assert_eq!(grid.columns[0].cells, ["×", "〇", "〇", "〇", "〇", "×"]);
    }

    #[test]
    fn shortfall_records_read_naturally() {
        let record = UnscheduledDemand {
            student: "山田".into(),
            subject: Subject::Math,
            shortfall: 2,
        };
        assert_eq!(record.to_string(), "山田 数学: 2 short");
    }

    #[test]
    fn slot_neighbours_stay_inside_the_day() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 2).unwrap();
        assert_eq!(SlotKey::new(d, 1).prev(), None);
        assert_eq!(SlotKey::new(d, 6).next(), None);
        assert_eq!(SlotKey::new(d, 3).next(), Some(SlotKey::new(d, 4)));
    }
}
