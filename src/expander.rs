use crate::activity::{ActivityRecord, ExpandedRow};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Signed day count of an inclusive span; zero or negative when `end < start`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// The calendar days of a single activity, one row per day.
#[derive(Debug, Clone)]
pub struct ActivityDays {
    name: String,
    start: NaiveDate,
    end: NaiveDate,
    next: NaiveDate,
    remaining: usize,
}

impl ActivityDays {
    fn empty(name: String, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            name,
            start,
            end,
            next: start,
            remaining: 0,
        }
    }
}

impl Iterator for ActivityDays {
    type Item = ExpandedRow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let row = ExpandedRow {
            name: self.name.clone(),
            start_date: self.start,
            end_date: self.end,
            execution_date: self.next,
        };
        self.remaining -= 1;
        if self.remaining > 0 {
            self.next = self.next + Duration::days(1);
        }
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ActivityDays {}

/// Why an activity produced no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InvalidDate,
    EndBeforeStart,
}

/// Expand one activity into its days.
///
/// Inverted spans (`end < start`) expand to zero rows. Records whose dates did
/// not parse also expand to zero rows; `Err` tells the caller which case hit.
pub fn expand(record: &ActivityRecord) -> Result<ActivityDays, SkipReason> {
    let Some((start, end)) = record.span() else {
        return Err(SkipReason::InvalidDate);
    };

    let days = days_inclusive(start, end);
    if days <= 0 {
        return Err(SkipReason::EndBeforeStart);
    }

    let mut expansion = ActivityDays::empty(record.name.clone(), start, end);
    expansion.remaining = days as usize;
    Ok(expansion)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionSummary {
    pub activity_count: usize,
    pub row_count: usize,
    pub skipped_invalid_dates: usize,
    pub skipped_inverted_ranges: usize,
    pub first_execution: Option<NaiveDate>,
    pub last_execution: Option<NaiveDate>,
}

impl ExpansionSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("activities={}", self.activity_count));
        parts.push(format!("rows={}", self.row_count));
        if let (Some(first), Some(last)) = (self.first_execution, self.last_execution) {
            parts.push(format!(
                "span={}..{}",
                crate::dates::format_date(first),
                crate::dates::format_date(last)
            ));
        }
        if self.skipped_invalid_dates > 0 {
            parts.push(format!("invalid_dates={}", self.skipped_invalid_dates));
        }
        if self.skipped_inverted_ranges > 0 {
            parts.push(format!("inverted={}", self.skipped_inverted_ranges));
        }
        parts.join(", ")
    }

    fn record_row(&mut self, date: NaiveDate) {
        self.row_count += 1;
        self.first_execution = Some(self.first_execution.map_or(date, |d| d.min(date)));
        self.last_execution = Some(self.last_execution.map_or(date, |d| d.max(date)));
    }
}

/// Lazy expansion over a whole table of activities.
///
/// Rows come out in activity order, then day order; nothing is buffered
/// beyond the activity currently being expanded.
pub struct ScheduleExpansion<I> {
    records: I,
    current: Option<ActivityDays>,
    summary: ExpansionSummary,
}

impl<I> ScheduleExpansion<I>
where
    I: Iterator<Item = ActivityRecord>,
{
    pub fn new<T>(records: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            records: records.into_iter(),
            current: None,
            summary: ExpansionSummary::default(),
        }
    }

    /// Counters for everything consumed so far.
    pub fn summary(&self) -> &ExpansionSummary {
        &self.summary
    }

    fn advance_record(&mut self) -> bool {
        let Some(record) = self.records.next() else {
            return false;
        };
        self.summary.activity_count += 1;
        match expand(&record) {
            Ok(days) => self.current = Some(days),
            Err(SkipReason::InvalidDate) => {
                self.summary.skipped_invalid_dates += 1;
                warn!(
                    activity = %record.name,
                    start = %record.start_date,
                    end = %record.end_date,
                    "activity has an unparsable date; no rows produced"
                );
            }
            Err(SkipReason::EndBeforeStart) => {
                self.summary.skipped_inverted_ranges += 1;
                warn!(
                    activity = %record.name,
                    start = %record.start_date,
                    end = %record.end_date,
                    "activity ends before it starts; no rows produced"
                );
            }
        }
        true
    }
}

impl<I> Iterator for ScheduleExpansion<I>
where
    I: Iterator<Item = ActivityRecord>,
{
    type Item = ExpandedRow;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.current.as_mut().and_then(|days| days.next()) {
                self.summary.record_row(row.execution_date);
                return Some(row);
            }
            self.current = None;
            if !self.advance_record() {
                return None;
            }
        }
    }
}
