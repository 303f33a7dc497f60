use crate::model::{EmployeeMonthGrid, SummaryRecord};
use crate::pipeline::MonthReport;
use chrono::NaiveDateTime;
use serde::Serialize;

pub static MISSING_TIME: &str = "00:00";

static SUMMARY_HEADER: [&str; 6] = [
    "Employee_ID",
    "Employee_Name",
    "Total_Working_Days",
    "Present_Days",
    "Absent_Days",
    "Attendance_Percentage",
];

/// Five rows per employee: header, In-Time, Out-Time, Status, Date.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeBlock {
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailTable {
    pub header: Vec<String>,
    pub blocks: Vec<EmployeeBlock>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DetailTable {
    pub fn from_report(report: &MonthReport) -> Self {
        let days = report.month.days_in_month();
        let mut header = vec!["Employee_Info".to_string(), "Detail_Type".to_string()];
        header.extend((1..=days).map(|d| format!("Day_{:02}", d)));

        Self {
            header,
            blocks: report.grids.iter().map(employee_block).collect(),
        }
    }
}

impl SummaryTable {
    pub fn from_report(report: &MonthReport) -> Self {
        Self {
            header: SUMMARY_HEADER.iter().map(|h| h.to_string()).collect(),
            rows: report.summaries.iter().map(summary_row).collect(),
        }
    }
}

fn employee_block(grid: &EmployeeMonthGrid) -> EmployeeBlock {
    let row = |info: String, kind: &str, cells: Vec<String>| {
        let mut r = Vec::with_capacity(cells.len() + 2);
        r.push(info);
        r.push(kind.to_string());
        r.extend(cells);
        r
    };

    let header = row(
        format!("{} - {}", grid.employee_id, grid.employee_name),
        "Header",
        vec![String::new(); grid.days.len()],
    );
    let in_time = row(
        "In-Time".into(),
        "InTime",
        grid.days.iter().map(|d| format_time(d.first_in)).collect(),
    );
    let out_time = row(
        "Out-Time".into(),
        "OutTime",
        grid.days.iter().map(|d| format_time(d.last_out)).collect(),
    );
    let status = row(
        "Status".into(),
        "Status",
        grid.days.iter().map(|d| d.status.code().to_string()).collect(),
    );
    let date = row(
        "Date".into(),
        "Date",
        grid.days.iter().map(|d| d.date.format("%d-%m-%Y").to_string()).collect(),
    );

    EmployeeBlock {
        rows: vec![header, in_time, out_time, status, date],
    }
}

fn format_time(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| MISSING_TIME.to_string())
}

pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value)
}

fn summary_row(s: &SummaryRecord) -> Vec<String> {
    vec![
        s.employee_id.clone(),
        s.employee_name.clone(),
        s.total_days.to_string(),
        s.present_days.to_string(),
        s.absent_days.to_string(),
        format_percentage(s.present_percentage),
    ]
}
