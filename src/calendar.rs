//! Opening rules of the winter term and the date span they apply to.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

use crate::data::Period;

static DATE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)/(\d+)").expect("valid date label pattern"));

/// Periods the school operates on `date`. First matching rule wins.
pub fn open_periods(date: NaiveDate) -> &'static [Period] {
    let (m, d) = (date.month(), date.day());

    if m == 1 && matches!(d, 7..=9) {
        return &[3, 4, 5, 6];
    }
    if m == 12 && matches!(d, 23 | 24) {
        return &[3, 4, 5, 6];
    }
    // periods 1 and 2 closed
    if (m == 12 && matches!(d, 20 | 21 | 27)) || (m == 1 && matches!(d, 4 | 10 | 11)) {
        return &[3, 4, 5];
    }
    if (m == 12 && matches!(d, 25 | 26)) || (m == 1 && d == 6) {
        return &[3, 4, 5, 6];
    }
    if m == 12 && d == 28 {
        return &[3, 4];
    }

    // regular weekdays and saturdays
    if (m == 12 && matches!(d, 2..=5 | 9..=12 | 16..=19))
        || (m == 1 && matches!(d, 13..=16 | 20..=23 | 27..=30))
    {
        return &[4, 5, 6];
    }
    if (m == 12 && matches!(d, 6 | 13)) || (m == 1 && matches!(d, 17 | 24 | 31)) {
        return &[2, 3, 4, 5];
    }

    &[]
}

pub fn is_open(date: NaiveDate, period: Period) -> bool {
    open_periods(date).contains(&period)
}

/// Finds the first `M/D` pair in a column label such as `12/02(Tue)`.
pub fn parse_date_label(label: &str) -> Option<(u32, u32)> {
    let caps = DATE_LABEL.captures(label)?;
    let month = caps[1].parse().ok()?;
    let day = caps[2].parse().ok()?;
    Some((month, day))
}

pub fn date_label(date: NaiveDate) -> String {
    date.format("%m/%d(%a)").to_string()
}

/// December 1 of `year` through January 31 of the following year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcademicSpan {
    pub year: i32,
}

impl AcademicSpan {
    pub fn new(year: i32) -> Self {
        Self { year }
    }

    pub fn start(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, 12, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn end(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year + 1, 1, 31).unwrap_or(NaiveDate::MAX)
    }

    /// December dates fall in `year`, every other month in `year + 1`.
    pub fn resolve(&self, month: u32, day: u32) -> Option<NaiveDate> {
        let year = if month == 12 { self.year } else { self.year + 1 };
        NaiveDate::from_ymd_opt(year, month, day)
    }

    pub fn resolve_label(&self, label: &str) -> Option<NaiveDate> {
        let (month, day) = parse_date_label(label)?;
        self.resolve(month, day)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let end = self.end();
        self.start()
            .iter_days()
            .take_while(move |d| *d <= end)
    }

    /// Consecutive 7-date windows; the last one may be shorter.
    pub fn weeks(&self) -> Vec<Vec<NaiveDate>> {
        let dates: Vec<NaiveDate> = self.dates().collect();
        dates.chunks(7).map(|w| w.to_vec()).collect()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start() && date <= self.end()
    }
}
