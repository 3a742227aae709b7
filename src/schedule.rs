use crate::activity::{ActivityRecord, EXECUTION_DATE_COLUMN, ExpandedRow};
use crate::dates;
use crate::expander::{ExpansionSummary, ScheduleExpansion};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeSet;
use tracing::info;

/// The exploded schedule: one row per (activity, day), in activity order then
/// day order. Identical rows from different activities are kept.
#[derive(Debug, Clone)]
pub struct ScheduleTable {
    df: DataFrame,
    summary: ExpansionSummary,
}

impl Default for ScheduleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleTable {
    pub fn new() -> Self {
        Self {
            df: DataFrame::empty_with_schema(&ExpandedRow::schema()),
            summary: ExpansionSummary::default(),
        }
    }

    /// Expand every activity and concatenate the rows once.
    pub fn from_activities<I>(records: I) -> PolarsResult<Self>
    where
        I: IntoIterator<Item = ActivityRecord>,
    {
        let mut expansion = ScheduleExpansion::new(records);
        let df = ExpandedRow::to_dataframe(&mut expansion)?;
        let summary = expansion.summary().clone();
        info!(summary = %summary.to_cli_summary(), "schedule expanded");
        Ok(Self { df, summary })
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn summary(&self) -> &ExpansionSummary {
        &self.summary
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn rows(&self) -> PolarsResult<Vec<ExpandedRow>> {
        let mut rows = Vec::with_capacity(self.df.height());
        for idx in 0..self.df.height() {
            rows.push(ExpandedRow::from_dataframe_row(&self.df, idx)?);
        }
        Ok(rows)
    }

    /// Distinct execution dates, ascending.
    pub fn execution_dates(&self) -> PolarsResult<Vec<NaiveDate>> {
        let column = self.df.column(EXECUTION_DATE_COLUMN)?.date()?;
        let mut days = BTreeSet::new();
        for idx in 0..self.df.height() {
            if let Some(day) = column.get(idx) {
                days.insert(day);
            }
        }
        Ok(days.into_iter().map(dates::date_from_i32).collect())
    }

    /// Rows whose execution date equals `date`, in their original order.
    pub fn filter_by_execution_date(&self, date: NaiveDate) -> PolarsResult<ScheduleTable> {
        let target = lit(dates::date_to_i32(date)).cast(DataType::Date);
        let df = self
            .df
            .clone()
            .lazy()
            .filter(col(EXECUTION_DATE_COLUMN).eq(target))
            .collect()?;

        let mut summary = self.summary.clone();
        summary.row_count = df.height();
        summary.first_execution = (df.height() > 0).then_some(date);
        summary.last_execution = summary.first_execution;

        Ok(Self { df, summary })
    }
}
