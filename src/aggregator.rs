use crate::model::{DayFact, Direction, PunchEvent};
use crate::months::YearMonth;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

pub type DayKey = (String, NaiveDate);

#[derive(Debug, Default, Clone, Copy)]
struct DayAccumulator {
    first_in: Option<NaiveDateTime>,
    last_out: Option<NaiveDateTime>,
}

impl DayAccumulator {
    fn push(&mut self, event: &PunchEvent) {
        match event.direction {
            Direction::In => {
                self.first_in = Some(self.first_in.map_or(event.timestamp, |t| t.min(event.timestamp)));
            }
            Direction::Out => {
                self.last_out = Some(self.last_out.map_or(event.timestamp, |t| t.max(event.timestamp)));
            }
            Direction::Unknown => {}
        }
    }
}

/// Reduces events to one `DayFact` per (employee, date) that has at least one
/// event in `month`. Days without events are never materialized here.
pub fn aggregate(events: &[PunchEvent], month: YearMonth) -> BTreeMap<DayKey, DayFact> {
    let mut days: BTreeMap<DayKey, DayAccumulator> = BTreeMap::new();
    for event in events.iter().filter(|e| month.contains(&e.timestamp)) {
        days.entry((event.employee_id.clone(), event.timestamp.date()))
            .or_default()
            .push(event);
    }

    days.into_iter()
        .map(|((id, date), acc)| {
            let fact = DayFact::new(id.clone(), date, acc.first_in, acc.last_out);
            ((id, date), fact)
        })
        .collect()
}

/// Splits aggregated facts into per-employee maps keyed by date.
pub fn by_employee(facts: BTreeMap<DayKey, DayFact>) -> BTreeMap<String, BTreeMap<NaiveDate, DayFact>> {
    let mut out: BTreeMap<String, BTreeMap<NaiveDate, DayFact>> = BTreeMap::new();
    for ((id, date), fact) in facts {
        out.entry(id).or_default().insert(date, fact);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DayStatus;

    fn ev(id: &str, ts: &str, direction: Direction) -> PunchEvent {
        PunchEvent {
            employee_id: id.into(),
            employee_name: "Ada".into(),
            timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M").unwrap(),
            direction,
        }
    }

    fn march() -> YearMonth {
        YearMonth::new(2024, 3).unwrap()
    }

    fn key(id: &str, d: u32) -> DayKey {
        (id.into(), NaiveDate::from_ymd_opt(2024, 3, d).unwrap())
    }

    #[test]
    fn earliest_in_and_latest_out() {
        let events = vec![
            ev("1", "2024-03-04 09:10", Direction::In),
            ev("1", "2024-03-04 17:00", Direction::Out),
            ev("1", "2024-03-04 13:00", Direction::In),
            ev("1", "2024-03-04 09:05", Direction::In),
            ev("1", "2024-03-04 17:30", Direction::Out),
        ];
        let facts = aggregate(&events, march());
        let fact = &facts[&key("1", 4)];
        assert_eq!(fact.first_in.unwrap().format("%H:%M").to_string(), "09:05");
        assert_eq!(fact.last_out.unwrap().format("%H:%M").to_string(), "17:30");
        assert_eq!(fact.status, DayStatus::Present);
    }

    #[test]
    fn single_in_is_partial() {
        let events = vec![ev("1", "2024-03-04 09:10", Direction::In)];
        let facts = aggregate(&events, march());
        assert_eq!(facts[&key("1", 4)].status, DayStatus::Partial);
        assert_eq!(facts[&key("1", 4)].last_out, None);
    }

    #[test]
    fn unknown_only_day_is_absent() {
        let events = vec![ev("1", "2024-03-04 09:10", Direction::Unknown)];
        let facts = aggregate(&events, march());
        assert_eq!(facts[&key("1", 4)].status, DayStatus::Absent);
    }

    #[test]
    fn filters_to_month_and_separates_employees() {
        let events = vec![
            ev("1", "2024-02-29 09:00", Direction::In),
            ev("1", "2024-03-01 09:00", Direction::In),
            ev("2", "2024-03-01 18:00", Direction::Out),
            ev("1", "2024-04-01 09:00", Direction::In),
        ];
        let facts = aggregate(&events, march());
        assert_eq!(facts.len(), 2);
        assert!(facts.contains_key(&key("1", 1)));
        assert!(facts.contains_key(&key("2", 1)));
        let grouped = by_employee(facts);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["2"].len(), 1);
    }

    #[test]
    fn order_independent() {
        let mut events = vec![
            ev("1", "2024-03-04 09:10", Direction::In),
            ev("1", "2024-03-04 17:00", Direction::Out),
            ev("2", "2024-03-05 08:00", Direction::In),
            ev("1", "2024-03-04 08:55", Direction::In),
        ];
        let first = aggregate(&events, march());
        events.reverse();
        assert_eq!(aggregate(&events, march()), first);
        assert_eq!(aggregate(&events, march()), aggregate(&events, march()));
    }
}
