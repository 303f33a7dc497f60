use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One row as handed over by a loader preset, before any interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub line: usize,
    pub employee_id: String,
    pub employee_name: String,
    pub label: String,
    pub datetime: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
    Unknown,
}

/// A badge scan with a resolved timestamp and canonical employee id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunchEvent {
    pub employee_id: String,
    pub employee_name: String,
    pub timestamp: NaiveDateTime,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Present,
    Partial,
    Absent,
}

impl DayStatus {
    pub fn from_punches(first_in: Option<NaiveDateTime>, last_out: Option<NaiveDateTime>) -> Self {
        match (first_in, last_out) {
            (Some(_), Some(_)) => DayStatus::Present,
            (Some(_), None) | (None, Some(_)) => DayStatus::Partial,
            (None, None) => DayStatus::Absent,
        }
    }

    /// Single-letter code used in the detail grid.
    pub fn code(&self) -> char {
        match self {
            DayStatus::Present => 'P',
            DayStatus::Partial => 'E',
            DayStatus::Absent => 'A',
        }
    }

    /// Partial days count as attended in the summary.
    pub fn is_attended(&self) -> bool {
        !matches!(self, DayStatus::Absent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayFact {
    pub employee_id: String,
    pub date: NaiveDate,
    pub first_in: Option<NaiveDateTime>,
    pub last_out: Option<NaiveDateTime>,
    pub status: DayStatus,
}

impl DayFact {
    pub fn new(
        employee_id: String,
        date: NaiveDate,
        first_in: Option<NaiveDateTime>,
        last_out: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            employee_id,
            date,
            first_in,
            last_out,
            status: DayStatus::from_punches(first_in, last_out),
        }
    }

    pub fn absent(employee_id: String, date: NaiveDate) -> Self {
        Self::new(employee_id, date, None, None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeMonthGrid {
    pub employee_id: String,
    pub employee_name: String,
    pub days: Vec<DayFact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub employee_id: String,
    pub employee_name: String,
    pub total_days: usize,
    pub present_days: usize,
    pub absent_days: usize,
    pub present_percentage: f64,
}
