use crate::model::{DayFact, EmployeeMonthGrid};
use crate::months::YearMonth;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Dense grid for one employee: every date of `month` in order, with an
/// ABSENT fact synthesized for dates the aggregator did not produce.
pub fn build_grid(
    employee_id: &str,
    employee_name: &str,
    facts: &BTreeMap<NaiveDate, DayFact>,
    month: YearMonth,
) -> EmployeeMonthGrid {
    let days = month
        .first_day()
        .iter_days()
        .take_while(|d| *d <= month.last_day())
        .map(|date| {
            facts
                .get(&date)
                .cloned()
                .unwrap_or_else(|| DayFact::absent(employee_id.to_string(), date))
        })
        .collect();

    EmployeeMonthGrid {
        employee_id: employee_id.to_string(),
        employee_name: employee_name.to_string(),
        days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DayStatus;
    use chrono::Duration;
    use rstest::rstest;

    fn fact(d: u32) -> DayFact {
        let date = NaiveDate::from_ymd_opt(2024, 4, d).unwrap();
        DayFact::new("00000001".into(), date, date.and_hms_opt(9, 0, 0), date.and_hms_opt(17, 0, 0))
    }

    #[test]
    fn fills_absent_days() {
        let facts: BTreeMap<_, _> = (1..=5).map(|d| (fact(d).date, fact(d))).collect();
        let grid = build_grid("00000001", "Ada", &facts, YearMonth::new(2024, 4).unwrap());

        assert_eq!(grid.days.len(), 30);
        assert!(grid.days[..5].iter().all(|d| d.status == DayStatus::Present));
        for day in &grid.days[5..] {
            assert_eq!(day.status, DayStatus::Absent);
            assert_eq!(day.first_in, None);
            assert_eq!(day.last_out, None);
            assert_eq!(day.employee_id, "00000001");
        }
    }

    #[rstest]
    #[case(2024, 2)]
    #[case(2023, 2)]
    #[case(2024, 12)]
    #[case(2024, 7)]
    fn complete_and_ordered(#[case] y: i32, #[case] m: u32) {
        let month = YearMonth::new(y, m).unwrap();
        let grid = build_grid("00000001", "Ada", &BTreeMap::new(), month);

        assert_eq!(grid.days.len(), month.days_in_month());
        assert_eq!(grid.days[0].date, month.first_day());
        for pair in grid.days.windows(2) {
            assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
        }
        assert_eq!(grid.days.last().unwrap().date, month.last_day());
    }
}
