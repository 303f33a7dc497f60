use std::path::PathBuf;

pub const DEFAULT_ID_WIDTH: usize = 8;

static IN_KEYWORDS: [&str; 4] = ["time in", "in", "entry", "check in"];
static OUT_KEYWORDS: [&str; 4] = ["time out", "out", "exit", "check out"];

#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    pub id_width: usize,
    pub in_keywords: Vec<String>,
    pub out_keywords: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            id_width: DEFAULT_ID_WIDTH,
            in_keywords: IN_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            out_keywords: OUT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// How months are picked for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthRequest {
    All,
    Listed(Vec<String>),
    Interactive,
}

impl MonthRequest {
    pub fn from_arg(months: Option<&str>) -> Self {
        match months.map(str::trim) {
            None | Some("") => MonthRequest::Interactive,
            Some(m) if m.eq_ignore_ascii_case("all") => MonthRequest::All,
            Some(m) => MonthRequest::Listed(
                m.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub preset: String,
    pub input: PathBuf,
    pub output: String,
    pub months: MonthRequest,
    pub stats: bool,
    pub normalizer: NormalizerConfig,
}
