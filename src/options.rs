use std::path::PathBuf;

use chrono::NaiveDate;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://media.xn--fni-snaa.fi";
pub const DEFAULT_OUTPUT_DIR: &str = "media";

/// Everything the pipeline needs to know about a run.
#[derive(Debug, Clone)]
pub struct Options {
    pub base_origin: Url,
    pub debug: bool,
    pub perspective: Option<String>,
    /// Sessions dated before this day are dropped.
    pub start: NaiveDate,
    pub output_dir: PathBuf,
    pub keep_order: bool,
    pub dry_run: bool,
}
