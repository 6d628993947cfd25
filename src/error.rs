use std::path::PathBuf;

use arrow::error::ArrowError;
use thiserror::Error;

/// Everything that can abort a run.
///
/// One policy applies to every variant: the error propagates to the binary,
/// which reports the failing stage with its cause chain and exits non-zero.
/// Nothing is retried or recovered locally.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure or non-2xx status while fetching the source file.
    #[error("fetching {url}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Local read/write/create/rename failure.
    #[error("{op} {}", .path.display())]
    Filesystem {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cached file could not be read as delimited tabular text.
    #[error("parsing {} as a table", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ArrowError,
    },

    /// The truncated table could not be serialized.
    #[error("encoding table as {format}")]
    Encode {
        format: &'static str,
        #[source]
        source: ArrowError,
    },

    /// Output format outside the supported set.
    #[error("unsupported output format `{0}`, expected `csv` or `json`")]
    UnsupportedFormat(String),

    /// The settings document or the source URL is unusable.
    #[error("{0}")]
    Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
