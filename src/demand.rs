use log::{debug, warn};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::data::{DemandRow, StudentName, Subject};

/// A student and the lessons still owed to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub name: StudentName,
    pub reqs: BTreeMap<Subject, u32>,
    pub remaining: u32,
}

impl Student {
    pub fn new(name: impl Into<String>, reqs: BTreeMap<Subject, u32>) -> Self {
        let remaining = reqs.values().sum();
        Self {
            name: name.into(),
            reqs,
            remaining,
        }
    }

    pub fn count(&self, subject: Subject) -> u32 {
        self.reqs.get(&subject).copied().unwrap_or(0)
    }

    /// Subject with the most units left; ties go to the lower `tie_rank`.
    pub fn next_subject(&self) -> Option<Subject> {
        Subject::ALL
            .into_iter()
            .filter(|&s| self.count(s) > 0)
            .max_by_key(|&s| (self.count(s), std::cmp::Reverse(s.tie_rank())))
    }

    /// Takes one unit of `subject`; no-op when nothing is left of it.
    pub fn consume(&mut self, subject: Subject) -> bool {
        match self.reqs.get_mut(&subject) {
            Some(n) if *n > 0 => {
                *n -= 1;
                self.remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

/// Students in demand-table order.
pub type DemandModel = Vec<Student>;

/// Most units one subject can request; five of these still fit a `u32` total.
pub const MAX_UNITS: u32 = 10_000;

fn coerce_count(value: &Value) -> u32 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() && n > 0.0 {
        n.trunc().min(f64::from(MAX_UNITS)) as u32
    } else {
        0
    }
}

fn read_counts(row: &DemandRow) -> BTreeMap<Subject, u32> {
    let mut reqs: BTreeMap<Subject, u32> = Subject::ALL.into_iter().map(|s| (s, 0)).collect();
    for (key, value) in &row.counts {
        match Subject::from_key(key) {
            Some(subject) => {
                let count = coerce_count(value);
                if count == MAX_UNITS {
                    warn!("student {}: {} capped at {MAX_UNITS} units", row.name, subject);
                }
                reqs.insert(subject, count);
            }
            None => debug!("student {}: ignoring column {:?}", row.name, key),
        }
    }
    reqs
}

/// Reads the requested-counts table.
///
/// A repeated name keeps its first position and takes the last row's counts.
pub fn build_demand(rows: &[DemandRow]) -> DemandModel {
    let mut students: DemandModel = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let name = row.name.trim();
        if name.is_empty() {
            continue;
        }
        let student = Student::new(name, read_counts(row));
        match index.get(name) {
            Some(&i) => {
                warn!("student {name} appears more than once; using the last row");
                students[i] = student;
            }
            None => {
                index.insert(name.to_string(), students.len());
                students.push(student);
            }
        }
    }
    students
}
