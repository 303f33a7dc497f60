use crate::model::{EmployeeMonthGrid, SummaryRecord};

pub fn summarize(grid: &EmployeeMonthGrid) -> SummaryRecord {
    let total_days = grid.days.len();
    let present_days = grid.days.iter().filter(|d| d.status.is_attended()).count();
    // a grid always covers at least one calendar day
    let ratio = present_days as f64 / total_days.max(1) as f64;

    SummaryRecord {
        employee_id: grid.employee_id.clone(),
        employee_name: grid.employee_name.clone(),
        total_days,
        present_days,
        absent_days: total_days - present_days,
        present_percentage: round2(ratio * 100.0),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DayFact, DayStatus};
    use chrono::NaiveDate;

    fn grid(statuses: &[DayStatus]) -> EmployeeMonthGrid {
        let days = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| {
                let date = NaiveDate::from_ymd_opt(2024, 4, i as u32 + 1).unwrap();
                let (first_in, last_out) = match status {
                    DayStatus::Present => (date.and_hms_opt(9, 0, 0), date.and_hms_opt(17, 0, 0)),
                    DayStatus::Partial => (date.and_hms_opt(9, 0, 0), None),
                    DayStatus::Absent => (None, None),
                };
                DayFact::new("00000001".into(), date, first_in, last_out)
            })
            .collect();
        EmployeeMonthGrid {
            employee_id: "00000001".into(),
            employee_name: "Ada".into(),
            days,
        }
    }

    #[test]
    fn partial_days_count_as_present() {
        let mut statuses = vec![DayStatus::Present; 18];
        statuses.extend(vec![DayStatus::Partial; 4]);
        statuses.extend(vec![DayStatus::Absent; 8]);

        let summary = summarize(&grid(&statuses));
        assert_eq!(summary.total_days, 30);
        assert_eq!(summary.present_days, 22);
        assert_eq!(summary.absent_days, 8);
        assert_eq!(summary.present_percentage, 73.33);
    }

    #[test]
    fn full_and_empty_months() {
        assert_eq!(summarize(&grid(&[DayStatus::Present; 30])).present_percentage, 100.0);
        let empty = summarize(&grid(&[DayStatus::Absent; 30]));
        assert_eq!(empty.present_days, 0);
        assert_eq!(empty.present_percentage, 0.0);
    }
}
