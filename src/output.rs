use crate::pipeline::MonthReport;
use crate::report::{DetailTable, SummaryTable};
use anyhow::{Context, Result};
use rust_xlsxwriter::Workbook;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub static WORKBOOK_NAME: &str = "attendance_report.xlsx";

pub enum Writer {
    Stdout(Box<dyn Write + Send>),
    JsonFile(BufWriter<File>, bool), // bool tracks if we've written the opening bracket
    JsonlFile(BufWriter<File>),
    CsvDir(PathBuf, XlsxBook),
    Xlsx(XlsxBook),
}

impl Writer {
    pub fn write_report(&mut self, report: &MonthReport) -> Result<()> {
        match self {
            Writer::Stdout(writer) => {
                let detail = DetailTable::from_report(report);
                let summary = SummaryTable::from_report(report);
                writeln!(writer, "=== {} ({}) ===", report.month.long_name(), report.month)?;
                writeln!(writer, "{}", detail.header.join("\t"))?;
                for block in &detail.blocks {
                    for row in &block.rows {
                        writeln!(writer, "{}", row.join("\t"))?;
                    }
                    writeln!(writer)?;
                }
                writeln!(writer, "--- Summary ---")?;
                writeln!(writer, "{}", summary.header.join("\t"))?;
                for row in &summary.rows {
                    writeln!(writer, "{}", row.join("\t"))?;
                }
                writeln!(writer)?;
            }
            Writer::JsonFile(writer, is_first) => {
                if *is_first {
                    write!(writer, "[")?;
                    *is_first = false;
                } else {
                    write!(writer, ",")?;
                }
                let serialized = serde_json::to_string_pretty(report)?;
                write!(writer, "\n{}", serialized)?;
            }
            Writer::JsonlFile(writer) => {
                let serialized = serde_json::to_string(report)?;
                writeln!(writer, "{}", serialized)?;
            }
            Writer::CsvDir(dir, book) => {
                let detail_path = dir.join(format!("report_{}.csv", report.month));
                write_csv(&detail_path, &detail_rows(&DetailTable::from_report(report)))?;
                info!("CSV saved: {}", detail_path.display());

                let summary_path = dir.join(format!("summary_{}.csv", report.month));
                write_csv(&summary_path, &summary_rows(&SummaryTable::from_report(report)))?;
                info!("Summary saved: {}", summary_path.display());

                book.add_report(report);
            }
            Writer::Xlsx(book) => book.add_report(report),
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        match self {
            Writer::JsonFile(ref mut writer, is_first) => {
                if is_first {
                    write!(writer, "[")?;
                }
                writeln!(writer, "\n]")?;
                writer.flush()?;
            }
            Writer::JsonlFile(ref mut writer) => {
                writer.flush()?;
            }
            Writer::Stdout(ref mut writer) => {
                writer.flush()?;
            }
            Writer::CsvDir(dir, book) => {
                book.save()?;
                info!("Reports saved in: {}", dir.display());
            }
            Writer::Xlsx(book) => book.save()?,
        }
        Ok(())
    }
}

pub fn create_writer(output_arg: &str) -> Result<Writer> {
    match output_arg {
        "stdout" => Ok(Writer::Stdout(Box::new(io::stdout()))),
        "dir" => {
            let dir = PathBuf::from(format!(
                "attendance_reports_{}",
                chrono::Local::now().format("%Y%m%d_%H%M%S")
            ));
            create_dir(&dir)
        }
        path if path.ends_with(".json") => {
            create_parent_dirs(path)?;
            let file = File::create(path).with_context(|| format!("creating {}", path))?;
            Ok(Writer::JsonFile(BufWriter::new(file), true))
        }
        path if path.ends_with(".jsonl") || path.ends_with(".ndjson") => {
            create_parent_dirs(path)?;
            let file = File::create(path).with_context(|| format!("creating {}", path))?;
            Ok(Writer::JsonlFile(BufWriter::new(file)))
        }
        path if path.ends_with(".xlsx") => {
            create_parent_dirs(path)?;
            Ok(Writer::Xlsx(XlsxBook::new(PathBuf::from(path))))
        }
        path => create_dir(Path::new(path)),
    }
}

fn create_dir(dir: &Path) -> Result<Writer> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(Writer::CsvDir(dir.to_path_buf(), XlsxBook::new(dir.join(WORKBOOK_NAME))))
}

fn create_parent_dirs(file_path: &str) -> Result<()> {
    if let Some(parent) = Path::new(file_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Detail rows as laid out in both the CSV and the workbook sheet, with a
/// `Separator` row closing each employee block.
fn detail_rows(table: &DetailTable) -> Vec<Vec<String>> {
    let days = table.header.len().saturating_sub(2);
    let mut rows = vec![table.header.clone()];
    for block in &table.blocks {
        rows.extend(block.rows.iter().cloned());
        let mut separator = vec![String::new(), "Separator".to_string()];
        separator.resize(days + 2, String::new());
        rows.push(separator);
    }
    rows
}

fn summary_rows(table: &SummaryTable) -> Vec<Vec<String>> {
    let mut rows = vec![table.header.clone()];
    rows.extend(table.rows.iter().cloned());
    rows
}

fn write_csv(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Sheets collected per month, saved as one workbook on `finish`.
pub struct XlsxBook {
    path: PathBuf,
    sheets: Vec<(String, Vec<Vec<String>>)>,
}

impl XlsxBook {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            sheets: Vec::new(),
        }
    }

    fn add_report(&mut self, report: &MonthReport) {
        let sheet_name = report.month.first_day().format("%B-%Y").to_string();
        let summary_name = format!("Summary-{}", sheet_name);
        self.sheets
            .push((sheet_name, detail_rows(&DetailTable::from_report(report))));
        self.sheets
            .push((summary_name, summary_rows(&SummaryTable::from_report(report))));
    }

    fn save(self) -> Result<()> {
        let mut workbook = Workbook::new();
        if self.sheets.is_empty() {
            workbook.add_worksheet();
        }
        for (name, rows) in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(name)?;
            for (r, row) in rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    if !cell.is_empty() {
                        worksheet.write_string(r as u32, c as u16, cell.as_str())?;
                    }
                }
            }
        }
        workbook
            .save(&self.path)
            .with_context(|| format!("saving {}", self.path.display()))?;
        info!("Excel file: {}", self.path.display());
        Ok(())
    }
}
