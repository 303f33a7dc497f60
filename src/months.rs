use crate::model::PunchEvent;
use anyhow::{Result, anyhow};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::warn;

static MONTH_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{1,2})$").expect("valid month key pattern"));
static INDEX_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*-\s*(\d+)$").expect("valid range pattern"));

/// Calendar month key, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn of(ts: &NaiveDateTime) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// First day of the following month minus one day.
    pub fn last_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        let next = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX);
        next - Duration::days(1)
    }

    pub fn days_in_month(&self) -> usize {
        (self.last_day() - self.first_day()).num_days() as usize + 1
    }

    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        ts.year() == self.year && ts.month() == self.month
    }

    /// e.g. `March 2024`
    pub fn long_name(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let caps = MONTH_KEY
            .captures(s.trim())
            .ok_or_else(|| anyhow!("invalid month '{}', expected YYYY-MM", s))?;
        let year: i32 = caps[1].parse()?;
        let month: u32 = caps[2].parse()?;
        YearMonth::new(year, month).ok_or_else(|| anyhow!("month out of range in '{}'", s))
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Sorted distinct months present in the events.
pub fn available_months(events: &[PunchEvent]) -> Vec<YearMonth> {
    events
        .iter()
        .map(|e| YearMonth::of(&e.timestamp))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Record and distinct-employee counts per month, for the selection menu.
pub fn month_overview(events: &[PunchEvent]) -> BTreeMap<YearMonth, (usize, usize)> {
    let mut per_month: BTreeMap<YearMonth, (usize, BTreeSet<&str>)> = BTreeMap::new();
    for e in events {
        let entry = per_month.entry(YearMonth::of(&e.timestamp)).or_default();
        entry.0 += 1;
        entry.1.insert(e.employee_id.as_str());
    }
    per_month
        .into_iter()
        .map(|(m, (records, employees))| (m, (records, employees.len())))
        .collect()
}

/// Keeps requested months that have data, chronologically and without duplicates.
pub fn select_listed(requested: &[String], available: &[YearMonth]) -> Vec<YearMonth> {
    let mut selected = BTreeSet::new();
    for key in requested {
        match key.parse::<YearMonth>() {
            Ok(month) if available.contains(&month) => {
                selected.insert(month);
            }
            Ok(month) => warn!("no data found for {}, skipping", month),
            Err(e) => warn!("{}", e),
        }
    }
    selected.into_iter().collect()
}

/// Parses `1,3,5-7` style input into 1-based indices within `1..=count`.
/// Returns the indices and a warning for every part that was rejected.
pub fn parse_selection(input: &str, count: usize) -> (BTreeSet<usize>, Vec<String>) {
    let mut indices = BTreeSet::new();
    let mut warnings = Vec::new();
    let in_range = |n: usize| (1..=count).contains(&n);

    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(caps) = INDEX_RANGE.captures(part) {
            match (caps[1].parse::<usize>(), caps[2].parse::<usize>()) {
                (Ok(start), Ok(end)) if in_range(start) && in_range(end) => {
                    indices.extend(start..=end);
                }
                (Ok(_), Ok(_)) => warnings.push(format!("Invalid range: {}", part)),
                _ => warnings.push(format!("Invalid range format: {}", part)),
            }
        } else {
            match part.parse::<usize>() {
                Ok(n) if in_range(n) => {
                    indices.insert(n);
                }
                Ok(n) => warnings.push(format!("Invalid month number: {}", n)),
                Err(_) => warnings.push(format!("Invalid input: {}", part)),
            }
        }
    }
    (indices, warnings)
}

/// Menu-driven month selection. EOF on `input` ends with nothing selected.
pub fn select_interactive<R: BufRead, W: Write>(
    overview: &BTreeMap<YearMonth, (usize, usize)>,
    mut input: R,
    out: &mut W,
) -> Result<Vec<YearMonth>> {
    let months: Vec<YearMonth> = overview.keys().copied().collect();
    if months.is_empty() {
        writeln!(out, "No months available for selection")?;
        return Ok(Vec::new());
    }

    writeln!(out, "\nAvailable months for report generation:")?;
    writeln!(out, "{}", "=".repeat(50))?;
    for (i, (month, (records, employees))) in overview.iter().enumerate() {
        writeln!(
            out,
            "{:2}. {:<15} ({:4} records, {:2} employees)",
            i + 1,
            month.long_name(),
            records,
            employees
        )?;
    }
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(out, "Enter numbers (1,3,5), ranges (1-3), 'all' or 'quit'")?;

    loop {
        write!(out, "\nSelect months: ")?;
        out.flush()?;
        let Some(line) = read_line(&mut input)? else {
            return Ok(Vec::new());
        };
        let selection = line.trim().to_lowercase();

        match selection.as_str() {
            "quit" => return Ok(Vec::new()),
            "all" => return Ok(months),
            _ => {}
        }

        let (indices, warnings) = parse_selection(&selection, months.len());
        for w in &warnings {
            writeln!(out, "{}", w)?;
        }
        if indices.is_empty() {
            writeln!(out, "No valid months selected. Please try again.")?;
            continue;
        }

        let chosen: Vec<YearMonth> = indices.iter().map(|&i| months[i - 1]).collect();
        writeln!(out, "\nSelected months:")?;
        for m in &chosen {
            writeln!(out, "  - {}", m.long_name())?;
        }
        write!(out, "Confirm selection? (y/n): ")?;
        out.flush()?;
        let Some(confirm) = read_line(&mut input)? else {
            return Ok(Vec::new());
        };
        if matches!(confirm.trim().to_lowercase().as_str(), "y" | "yes") {
            return Ok(chosen);
        }
    }
}

fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}
