use crate::columns::CanonicalColumn;
use crate::dates::{self, ScheduleDate};
use chrono::NaiveDate;
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const EXECUTION_DATE_COLUMN: &str = "Data de Execução";

/// One row of the source table after column normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    pub name: String,
    pub start_date: ScheduleDate,
    pub end_date: ScheduleDate,
}

impl ActivityRecord {
    pub fn new(
        name: impl Into<String>,
        start_date: impl Into<ScheduleDate>,
        end_date: impl Into<ScheduleDate>,
    ) -> Self {
        Self {
            name: name.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }

    /// Build a record from the raw cell text, coercing both dates.
    pub fn parse(name: &str, start: &str, end: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            start_date: ScheduleDate::parse(start),
            end_date: ScheduleDate::parse(end),
        }
    }

    /// Both dates, when both parsed.
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.start_date.valid()?, self.end_date.valid()?))
    }
}

/// One calendar day of an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandedRow {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub execution_date: NaiveDate,
}

impl ExpandedRow {
    pub fn schema() -> Schema {
        Schema::from_iter(vec![
            Field::new(CanonicalColumn::Activity.header().into(), DataType::String),
            Field::new(CanonicalColumn::StartDate.header().into(), DataType::Date),
            Field::new(CanonicalColumn::EndDate.header().into(), DataType::Date),
            Field::new(EXECUTION_DATE_COLUMN.into(), DataType::Date),
        ])
    }

    /// Materialize a batch of rows as one dataframe, in the order given.
    pub fn to_dataframe<I>(rows: I) -> PolarsResult<DataFrame>
    where
        I: IntoIterator<Item = ExpandedRow>,
    {
        let rows = rows.into_iter();
        let (lower, _) = rows.size_hint();
        let mut names: Vec<String> = Vec::with_capacity(lower);
        let mut starts: Vec<i32> = Vec::with_capacity(lower);
        let mut ends: Vec<i32> = Vec::with_capacity(lower);
        let mut executions: Vec<i32> = Vec::with_capacity(lower);

        for row in rows {
            starts.push(dates::date_to_i32(row.start_date));
            ends.push(dates::date_to_i32(row.end_date));
            executions.push(dates::date_to_i32(row.execution_date));
            names.push(row.name);
        }

        let columns = vec![
            Series::new(CanonicalColumn::Activity.header().into(), names).into_column(),
            Self::date_series(CanonicalColumn::StartDate.header(), starts)?.into_column(),
            Self::date_series(CanonicalColumn::EndDate.header(), ends)?.into_column(),
            Self::date_series(EXECUTION_DATE_COLUMN, executions)?.into_column(),
        ];
        DataFrame::new(columns)
    }

    pub fn from_dataframe_row(df: &DataFrame, row_idx: usize) -> PolarsResult<Self> {
        let name = df
            .column(CanonicalColumn::Activity.header())?
            .str()?
            .get(row_idx)
            .unwrap_or("")
            .to_string();

        Ok(Self {
            name,
            start_date: Self::date_at(df, CanonicalColumn::StartDate.header(), row_idx)?,
            end_date: Self::date_at(df, CanonicalColumn::EndDate.header(), row_idx)?,
            execution_date: Self::date_at(df, EXECUTION_DATE_COLUMN, row_idx)?,
        })
    }

    fn date_series(name: &str, days: Vec<i32>) -> PolarsResult<Series> {
        Series::new(PlSmallStr::from(name), days).cast(&DataType::Date)
    }

    fn date_at(df: &DataFrame, column: &str, row_idx: usize) -> PolarsResult<NaiveDate> {
        df.column(column)?
            .date()?
            .get(row_idx)
            .map(dates::date_from_i32)
            .ok_or_else(|| {
                PolarsError::ComputeError(format!("row {row_idx} missing {column}").into())
            })
    }
}
