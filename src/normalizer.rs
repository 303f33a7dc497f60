use crate::config::NormalizerConfig;
use crate::model::{Direction, PunchEvent, RawRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, warn};

/// Tried in this order before any permissive fallback.
static PRIMARY_FORMATS: [&str; 7] = [
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M",
];

static FALLBACK_FORMATS: [&str; 8] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

static FALLBACK_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d.%m.%Y"];

/// Result of normalizing a whole batch of raw records.
#[derive(Debug, Default)]
pub struct Normalized {
    pub events: Vec<PunchEvent>,
    pub dropped: usize,
    pub unknown_direction: usize,
}

pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        let config = NormalizerConfig {
            in_keywords: lowercase_all(config.in_keywords),
            out_keywords: lowercase_all(config.out_keywords),
            ..config
        };
        Self { config }
    }

    pub fn normalize(&self, record: &RawRecord) -> Option<PunchEvent> {
        let timestamp = parse_timestamp(&record.datetime)?;
        Some(PunchEvent {
            employee_id: canonical_id(&record.employee_id, self.config.id_width),
            employee_name: record.employee_name.trim().to_string(),
            timestamp,
            direction: self.direction(&record.label),
        })
    }

    pub fn normalize_all(&self, records: &[RawRecord]) -> Normalized {
        let mut out = Normalized {
            events: Vec::with_capacity(records.len()),
            ..Normalized::default()
        };
        for record in records {
            match self.normalize(record) {
                Some(event) => {
                    if event.direction == Direction::Unknown {
                        out.unknown_direction += 1;
                    }
                    out.events.push(event);
                }
                None => {
                    debug!(
                        line = record.line,
                        datetime = %record.datetime,
                        "dropping record with unparsable date-time"
                    );
                    out.dropped += 1;
                }
            }
        }
        if out.dropped > 0 {
            warn!("failed to parse {} date-time entries", out.dropped);
        }
        out
    }

    pub fn direction(&self, label: &str) -> Direction {
        let label = label.trim().to_lowercase();
        let is_in = self.config.in_keywords.iter().any(|k| label.contains(k.as_str()));
        let is_out = self.config.out_keywords.iter().any(|k| label.contains(k.as_str()));
        match (is_in, is_out) {
            (true, false) => Direction::In,
            (false, true) => Direction::Out,
            _ => Direction::Unknown,
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

fn lowercase_all(keywords: Vec<String>) -> Vec<String> {
    keywords.into_iter().map(|k| k.to_lowercase()).collect()
}

/// Zero-fills an id to `width`; longer ids are kept unchanged.
pub fn canonical_id(raw: &str, width: usize) -> String {
    format!("{:0>width$}", raw.trim(), width = width)
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    PRIMARY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| parse_permissive(s))
}

fn parse_permissive(s: &str) -> Option<NaiveDateTime> {
    // offsets are dropped: punches are already in facility local time
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| {
            FALLBACK_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        })
        .or_else(|| {
            FALLBACK_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}
