//! Output artifacts: the JSON summary and the timetable workbook, plus the
//! reader that turns a previously written workbook back into a seed schedule.

use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use log::{debug, info};
use std::io::Cursor;
use std::path::Path;

use crate::calendar::{AcademicSpan, date_label, is_open};
use crate::data::{
    PERIODS, Period, PriorSchedule, ScheduledSlot, SchedulingOutput, SlotKey, Subject,
    UnscheduledDemand,
};
use crate::error::{Result, ScheduleError};
use crate::solver::EngineRun;

pub const SCHEDULE_SHEET: &str = "時間割";
pub const UNSCHEDULED_SHEET: &str = "未消化リスト";
const PERIOD_HEADER: &str = "講";
const CLOSED: &str = "×";
// rows per week block: header, six periods, separator
const BLOCK_ROWS: u32 = 8;

pub fn unscheduled(run: &EngineRun) -> Vec<UnscheduledDemand> {
    run.students
        .iter()
        .flat_map(|student| {
            Subject::ALL.into_iter().filter_map(move |subject| {
                let shortfall = student.count(subject);
                (shortfall > 0).then(|| UnscheduledDemand {
                    student: student.name.clone(),
                    subject,
                    shortfall,
                })
            })
        })
        .collect()
}

pub fn build_output(run: &EngineRun, seeded_entries: u32, academic_year: i32) -> SchedulingOutput {
    let slots = run
        .state
        .schedule
        .iter()
        .map(|(key, slot)| ScheduledSlot {
            date: key.date,
            period: key.period,
            capacity: slot.capacity,
            entries: slot.entries.iter().map(|e| e.to_string()).collect(),
        })
        .collect();

    SchedulingOutput {
        slots,
        unscheduled: unscheduled(run),
        termination: run.termination,
        iterations: run.iterations,
        assignments_made: run.assignments,
        seeded_entries,
        academic_year,
    }
}

fn workbook_err(e: impl std::fmt::Display) -> ScheduleError {
    ScheduleError::Workbook(e.to_string())
}

/// Renders the timetable workbook as xlsx bytes.
pub fn write_workbook(output: &SchedulingOutput) -> Result<Vec<u8>> {
    let span = AcademicSpan::new(output.academic_year);
    let schedule = output.schedule();

    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_mut(&0)
        .ok_or_else(|| workbook_err("new workbook has no sheet"))?;
    sheet.set_name(SCHEDULE_SHEET);

    for (week, dates) in span.weeks().iter().enumerate() {
        let top = week as u32 * BLOCK_ROWS + 1;

        let header = sheet.get_cell_mut((1, top));
        header.set_value(PERIOD_HEADER);
        header.get_style_mut().get_font_mut().set_bold(true);
        for (i, &date) in dates.iter().enumerate() {
            let cell = sheet.get_cell_mut((i as u32 + 2, top));
            cell.set_value(date_label(date));
            cell.get_style_mut().get_font_mut().set_bold(true);
        }

        for period in PERIODS {
            let row = top + period as u32;
            sheet
                .get_cell_mut((1, row))
                .set_value_number(f64::from(period));
            for (i, &date) in dates.iter().enumerate() {
                let text = match schedule.get(&SlotKey::new(date, period)) {
                    Some(entries) if !entries.is_empty() => entries.join("\n"),
                    _ if is_open(date, period) => String::new(),
                    _ => CLOSED.to_string(),
                };
                let cell = sheet.get_cell_mut((i as u32 + 2, row));
                cell.set_value(text);
                cell.get_style_mut().get_alignment_mut().set_wrap_text(true);
            }
        }
    }
    sheet.get_column_dimension_mut("A").set_width(5.0);
    for col in ["B", "C", "D", "E", "F", "G", "H"] {
        sheet.get_column_dimension_mut(col).set_width(18.0);
    }

    if !output.unscheduled.is_empty() {
        let sheet = book.new_sheet(UNSCHEDULED_SHEET).map_err(workbook_err)?;
        for (col, title) in ["生徒名", "科目", "不足"].into_iter().enumerate() {
            sheet.get_cell_mut((col as u32 + 1, 1)).set_value(title);
        }
        for (i, record) in output.unscheduled.iter().enumerate() {
            let row = i as u32 + 2;
            sheet.get_cell_mut((1, row)).set_value(record.student.as_str());
            sheet.get_cell_mut((2, row)).set_value(record.subject.label());
            sheet
                .get_cell_mut((3, row))
                .set_value_number(f64::from(record.shortfall));
        }
    }

    let mut buf = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut buf).map_err(workbook_err)?;
    info!(
        "Wrote workbook with {} scheduled entries and {} shortfall rows",
        schedule.values().map(Vec::len).sum::<usize>(),
        output.unscheduled.len()
    );
    Ok(buf.into_inner())
}

pub fn write_workbook_file(output: &SchedulingOutput, path: impl AsRef<Path>) -> Result<()> {
    let bytes = write_workbook(output)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if (f.floor() - f).abs() < f64::EPSILON {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Int(i) => format!("{}", i),
        Data::Empty | Data::Error(_) => String::new(),
        other => other.to_string(),
    }
}

fn period_label(text: &str) -> Option<Period> {
    let period: Period = text.parse().ok()?;
    PERIODS.contains(&period).then_some(period)
}

/// Reads a previously written timetable back into slot contents.
///
/// Header rows are any rows carrying `M/D` labels after the first column;
/// period rows are those whose first cell is exactly 1 to 6.
pub fn read_prior_schedule(bytes: &[u8], span: AcademicSpan) -> Result<PriorSchedule> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
    let names = workbook.sheet_names();
    let sheet = names
        .iter()
        .find(|n| n.as_str() == SCHEDULE_SHEET)
        .or_else(|| names.first())
        .cloned()
        .ok_or_else(|| workbook_err("workbook has no sheets"))?;
    let range = workbook.worksheet_range(&sheet)?;

    let mut prior = PriorSchedule::new();
    let mut columns: Vec<(usize, chrono::NaiveDate)> = Vec::new();

    for row in range.rows() {
        let cells: Vec<String> = row.iter().map(cell_to_string).collect();

        if let Some(period) = cells.first().and_then(|c| period_label(c)) {
            for &(col, date) in &columns {
                let Some(text) = cells.get(col) else {
                    continue;
                };
                if text.is_empty() || text == CLOSED || text == "-" {
                    continue;
                }
                let entries: Vec<String> = text
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect();
                if !entries.is_empty() {
                    prior.insert(SlotKey::new(date, period), entries);
                }
            }
            continue;
        }

        let header: Vec<(usize, chrono::NaiveDate)> = cells
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(i, text)| span.resolve_label(text).map(|date| (i, date)))
            .collect();
        if !header.is_empty() {
            columns = header;
        }
    }

    debug!("read {} occupied slots from sheet {sheet}", prior.len());
    Ok(prior)
}

pub fn read_prior_schedule_file(path: impl AsRef<Path>, span: AcademicSpan) -> Result<PriorSchedule> {
    let bytes = std::fs::read(path)?;
    read_prior_schedule(&bytes, span)
}
