use super::LoadError;
use crate::model::RawRecord;
use csv::{ReaderBuilder, StringRecord};

static ID_HEADERS: [&str; 4] = ["employee_id", "enno", "empid", "id"];
static NAME_HEADERS: [&str; 2] = ["employee_name", "name"];
static LABEL_HEADERS: [&str; 4] = ["label", "tr", "mode", "type"];
static DATETIME_HEADERS: [&str; 3] = ["datetime", "timestamp", "time"];

struct Columns {
    id: usize,
    name: Option<usize>,
    label: usize,
    datetime: usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, LoadError> {
        let find = |names: &[&str]| {
            names.iter().find_map(|n| {
                headers
                    .iter()
                    .position(|h| h.trim().eq_ignore_ascii_case(n))
            })
        };
        let require = |names: &[&str]| {
            find(names).ok_or_else(|| LoadError::MissingColumn(names[0].to_string()))
        };
        Ok(Self {
            id: require(&ID_HEADERS)?,
            name: find(&NAME_HEADERS),
            label: require(&LABEL_HEADERS)?,
            datetime: require(&DATETIME_HEADERS)?,
        })
    }

    fn max_index(&self) -> usize {
        self.id.max(self.label).max(self.datetime)
    }
}

/// Comma-separated punches with a header row naming the columns.
pub fn parse_delimited(input: &str) -> Result<(Vec<RawRecord>, usize), LoadError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input.as_bytes());

    let columns = Columns::locate(reader.headers()?)?;
    let mut out = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("skipping unreadable row: {}", e);
                skipped += 1;
                continue;
            }
        };
        let line = record.position().map_or(0, |p| p.line() as usize);
        if record.len() <= columns.max_index() {
            tracing::debug!(line, "skipping short row");
            skipped += 1;
            continue;
        }
        let get = |i: usize| record.get(i).unwrap_or_default().to_string();
        out.push(RawRecord {
            line,
            employee_id: get(columns.id),
            employee_name: columns.name.map(get).unwrap_or_default(),
            label: get(columns.label),
            datetime: get(columns.datetime),
        });
    }
    Ok((out, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sample() {
        let input = "EmpID,Name,Label,DateTime\n\
7,\"Lovelace, Ada\",Time In,2024-03-04 09:05:00\n\
7,\"Lovelace, Ada\",Time Out,2024-03-04 17:30:00\n\
8,Bob\n";
        let (records, skipped) = parse_delimited(input).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(skipped, 1);
        assert_eq!(records[0].employee_name, "Lovelace, Ada");
        assert_eq!(records[0].line, 2);
        assert_eq!(records[1].label, "Time Out");
        assert_eq!(records[1].datetime, "2024-03-04 17:30:00");
    }

    #[test]
    fn name_column_is_optional() {
        let (records, _) = parse_delimited("timestamp,id,type\n2024-03-04 09:00,7,in\n").unwrap();
        assert_eq!(records[0].employee_id, "7");
        assert_eq!(records[0].employee_name, "");
        assert_eq!(records[0].label, "in");
    }

    #[test]
    fn missing_required_column() {
        let err = parse_delimited("id,name,datetime\n1,a,2024-03-04 09:00\n").unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(c) if c == "label"));
    }
}
