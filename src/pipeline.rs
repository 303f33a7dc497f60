use crate::aggregator::{aggregate, by_employee};
use crate::grid::build_grid;
use crate::model::{EmployeeMonthGrid, PunchEvent, RawRecord, SummaryRecord};
use crate::months::{YearMonth, available_months};
use crate::normalizer::Normalizer;
use crate::summary::summarize;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("no data found for {0}")]
    EmptyMonth(YearMonth),
    #[error("no valid months found in the input")]
    NoValidMonths,
}

/// Everything a report run needs, threaded explicitly between stages.
#[derive(Debug, Default)]
pub struct Dataset {
    pub raw_records: usize,
    pub skipped_lines: usize,
    pub dropped: usize,
    pub unknown_direction: usize,
    pub events: Vec<PunchEvent>,
    pub months: Vec<YearMonth>,
}

impl Dataset {
    pub fn from_records(
        records: &[RawRecord],
        skipped_lines: usize,
        normalizer: &Normalizer,
    ) -> Result<Self, ReportError> {
        let normalized = normalizer.normalize_all(records);
        let months = available_months(&normalized.events);
        if months.is_empty() {
            return Err(ReportError::NoValidMonths);
        }
        Ok(Self {
            raw_records: records.len(),
            skipped_lines,
            dropped: normalized.dropped,
            unknown_direction: normalized.unknown_direction,
            events: normalized.events,
            months,
        })
    }

    pub fn employee_count(&self) -> usize {
        self.events
            .iter()
            .map(|e| e.employee_id.as_str())
            .collect::<std::collections::BTreeSet<_>>()
            .len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthReport {
    pub month: YearMonth,
    pub grids: Vec<EmployeeMonthGrid>,
    pub summaries: Vec<SummaryRecord>,
}

pub fn build_month_report(events: &[PunchEvent], month: YearMonth) -> Result<MonthReport, ReportError> {
    let month_events: Vec<&PunchEvent> = events.iter().filter(|e| month.contains(&e.timestamp)).collect();
    if month_events.is_empty() {
        return Err(ReportError::EmptyMonth(month));
    }

    let names = employee_names(&month_events);
    let mut facts = by_employee(aggregate(events, month));

    // employees whose events are all UNKNOWN still get a grid
    let grids: Vec<EmployeeMonthGrid> = names
        .iter()
        .map(|(id, name)| {
            let days = facts.remove(id).unwrap_or_default();
            build_grid(id, name, &days, month)
        })
        .collect();
    let summaries = grids.iter().map(summarize).collect();

    info!(
        "{}: {} employees over {} days",
        month,
        grids.len(),
        month.days_in_month()
    );
    Ok(MonthReport {
        month,
        grids,
        summaries,
    })
}

/// Smallest non-empty name seen per employee id, sorted by id.
fn employee_names(events: &[&PunchEvent]) -> BTreeMap<String, String> {
    let mut names: BTreeMap<String, String> = BTreeMap::new();
    for e in events {
        let name = names.entry(e.employee_id.clone()).or_default();
        if !e.employee_name.is_empty() && (name.is_empty() || e.employee_name < *name) {
            *name = e.employee_name.clone();
        }
    }
    names
}

/// Builds every requested month independently; empty months are logged and
/// skipped. Output stays in chronological order.
pub fn build_reports(events: &[PunchEvent], months: &[YearMonth]) -> Vec<MonthReport> {
    let mut months = months.to_vec();
    months.sort();
    months.dedup();

    #[cfg(feature = "parallel")]
    let results: Vec<Result<MonthReport, ReportError>> = months
        .par_iter()
        .map(|m| build_month_report(events, *m))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let results: Vec<Result<MonthReport, ReportError>> =
        months.iter().map(|m| build_month_report(events, *m)).collect();

    results
        .into_iter()
        .filter_map(|r| match r {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("{}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DayStatus;
    use chrono::NaiveDateTime;

    fn rec(line: usize, id: &str, name: &str, label: &str, dt: &str) -> RawRecord {
        RawRecord {
            line,
            employee_id: id.into(),
            employee_name: name.into(),
            label: label.into(),
            datetime: dt.into(),
        }
    }

    fn dataset(records: &[RawRecord]) -> Dataset {
        Dataset::from_records(records, 0, &Normalizer::default()).unwrap()
    }

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    #[test]
    fn ids_collapse_to_one_employee() {
        let data = dataset(&[
            rec(1, "7", "Ada", "Time In", "2024-04-02 09:00:00"),
            rec(2, "00000007", "Ada", "Time Out", "2024-04-02 17:00:00"),
        ]);
        let report = build_month_report(&data.events, ym(2024, 4)).unwrap();
        assert_eq!(report.grids.len(), 1);
        assert_eq!(report.grids[0].employee_id, "00000007");
        assert_eq!(report.grids[0].days[1].status, DayStatus::Present);
        assert_eq!(report.summaries[0].present_days, 1);
    }

    #[test]
    fn malformed_rows_are_isolated() {
        let records = vec![
            rec(1, "1", "Ada", "Time In", "2024-04-02 09:00:00"),
            rec(2, "1", "Ada", "Time Out", "not a date"),
            rec(3, "2", "Bob", "Time In", "2024-04-02 08:00:00"),
            rec(4, "2", "Bob", "Time Out", "2024-04-02 16:00:00"),
            rec(5, "2", "Bob", "Time Out", "31/31/2024 16:00"),
        ];
        let data = dataset(&records);
        assert_eq!(data.dropped, 2);
        assert_eq!(data.raw_records, 5);

        let report = build_month_report(&data.events, ym(2024, 4)).unwrap();
        assert_eq!(report.grids[0].days[1].status, DayStatus::Partial);
        assert_eq!(report.grids[1].days[1].status, DayStatus::Present);
    }

    #[test]
    fn unknown_only_employee_gets_all_absent_grid() {
        let data = dataset(&[
            rec(1, "1", "Ada", "Time In", "2024-04-02 09:00:00"),
            rec(2, "3", "Cy", "Badge", "2024-04-03 09:00:00"),
        ]);
        assert_eq!(data.unknown_direction, 1);
        let report = build_month_report(&data.events, ym(2024, 4)).unwrap();
        let cy = &report.grids[1];
        assert_eq!(cy.employee_id, "00000003");
        assert!(cy.days.iter().all(|d| d.status == DayStatus::Absent));
        assert_eq!(report.summaries[1].present_days, 0);
    }

    #[test]
    fn no_valid_months() {
        let records = vec![rec(1, "1", "Ada", "Time In", "")];
        let err = Dataset::from_records(&records, 0, &Normalizer::default()).unwrap_err();
        assert_eq!(err, ReportError::NoValidMonths);
    }

    #[test]
    fn empty_month_is_skipped() {
        let data = dataset(&[
            rec(1, "1", "Ada", "Time In", "2024-04-02 09:00:00"),
            rec(2, "1", "Ada", "Time In", "2024-06-02 09:00:00"),
        ]);
        assert_eq!(
            build_month_report(&data.events, ym(2024, 5)).unwrap_err(),
            ReportError::EmptyMonth(ym(2024, 5))
        );
        let reports = build_reports(&data.events, &[ym(2024, 6), ym(2024, 5), ym(2024, 4)]);
        let months: Vec<_> = reports.iter().map(|r| r.month).collect();
        assert_eq!(months, vec![ym(2024, 4), ym(2024, 6)]);
    }

    #[test]
    fn name_choice_ignores_event_order() {
        let mk = |name: &str| PunchEvent {
            employee_id: "00000001".into(),
            employee_name: name.into(),
            timestamp: NaiveDateTime::parse_from_str("2024-04-02 09:00", "%Y-%m-%d %H:%M").unwrap(),
            direction: crate::model::Direction::In,
        };
        let a = [mk(""), mk("Zed"), mk("Ada")];
        let b = [mk("Ada"), mk("Zed"), mk("")];
        let names_a = employee_names(&a.iter().collect::<Vec<_>>());
        let names_b = employee_names(&b.iter().collect::<Vec<_>>());
        assert_eq!(names_a["00000001"], "Ada");
        assert_eq!(names_a, names_b);
    }

    #[test]
    fn employees_sorted_by_id() {
        let data = dataset(&[
            rec(1, "20", "Zoe", "Time In", "2024-04-02 09:00:00"),
            rec(2, "3", "Cy", "Time In", "2024-04-02 09:00:00"),
        ]);
        let report = build_month_report(&data.events, ym(2024, 4)).unwrap();
        let ids: Vec<_> = report.grids.iter().map(|g| g.employee_id.as_str()).collect();
        assert_eq!(ids, vec!["00000003", "00000020"]);
        assert_eq!(data.employee_count(), 2);
    }
}
