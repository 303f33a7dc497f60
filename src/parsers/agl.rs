use crate::model::RawRecord;
use memchr::memchr_iter;

/// Preamble lines written by the time clock before the first punch.
const PREAMBLE_LINES: usize = 5;
/// `No TMNo EnNo Name GMNo Mode IN/OUT Antipass DaiGong DateTime` are required, `TR` is optional.
const MIN_FIELDS: usize = 10;

const COL_ID: usize = 2;
const COL_NAME: usize = 3;
const COL_DATETIME: usize = 9;
const COL_LABEL: usize = 10;

/// Parsed rows plus the number of lines rejected as malformed.
pub fn parse_agl(input: &str) -> (Vec<RawRecord>, usize) {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() / 80);
    let mut skipped = 0usize;

    let mut start = 0usize;
    let mut line_no = 0usize;
    let mut handle = |line: &[u8], line_no: usize| {
        if line_no <= PREAMBLE_LINES || is_blank(line) {
            return;
        }
        match parse_line(line, line_no) {
            Some(record) => out.push(record),
            None => {
                tracing::debug!(line = line_no, "skipping malformed line");
                skipped += 1;
            }
        }
    };

    for nl in memchr_iter(b'\n', bytes) {
        line_no += 1;
        handle(trim_cr(&bytes[start..nl]), line_no);
        start = nl + 1;
    }
    if start < bytes.len() {
        line_no += 1;
        handle(trim_cr(&bytes[start..]), line_no);
    }
    (out, skipped)
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

fn parse_line(line: &[u8], line_no: usize) -> Option<RawRecord> {
    let s = std::str::from_utf8(line).ok()?;
    let mut fields = Vec::with_capacity(11);
    let mut field_start = 0usize;
    for sep in memchr_iter(b'\t', line) {
        fields.push(&s[field_start..sep]);
        field_start = sep + 1;
    }
    fields.push(&s[field_start..]);

    if fields.len() < MIN_FIELDS {
        return None;
    }
    let field = |i: usize| fields.get(i).map(|f| f.trim().to_string()).unwrap_or_default();

    Some(RawRecord {
        line: line_no,
        employee_id: field(COL_ID),
        employee_name: field(COL_NAME),
        label: field(COL_LABEL),
        datetime: field(COL_DATETIME),
    })
}
