pub mod agl;
pub mod delimited;

use crate::model::RawRecord;
use std::borrow::Cow;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),
    #[error("missing required column '{0}'")]
    MissingColumn(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Rows handed to the normalizer plus the count of malformed lines skipped.
#[derive(Debug, Default)]
pub struct Loaded {
    pub records: Vec<RawRecord>,
    pub skipped_lines: usize,
}

pub fn parse(preset: &str, input: &str) -> Result<Loaded, LoadError> {
    let (records, skipped_lines) = match preset {
        "agl" => agl::parse_agl(input),
        "csv" => delimited::parse_delimited(input)?,
        _ => return Err(LoadError::UnknownPreset(preset.to_string())),
    };
    Ok(Loaded {
        records,
        skipped_lines,
    })
}

/// UTF-8 (BOM stripped) when valid, Latin-1 otherwise.
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => {
            tracing::info!("input is not valid UTF-8, decoding as latin1");
            Cow::Owned(bytes.iter().map(|&b| b as char).collect())
        }
    }
}
