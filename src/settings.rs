use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Run configuration, read from a YAML settings document.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Source URL of the remote CSV resource.
    pub url: String,
    /// Folder holding the unmodified downloaded source file.
    pub cache_folder: PathBuf,
    /// Reuse a previously downloaded copy when one exists.
    #[serde(default = "default_cache")]
    pub cache: bool,
    /// Number of leading columns to keep.
    pub cols: usize,
    /// Number of leading rows to keep.
    pub rows: usize,
    /// Folder the output artifact is written to.
    pub output_destination: PathBuf,
    /// Serialization for the output artifact, `csv` or `json`.
    pub output_format: String,
    /// Folder for `log.txt`; absent means log to stderr.
    #[serde(default)]
    pub logs_folder: Option<PathBuf>,
}

fn default_cache() -> bool {
    true
}

impl Settings {
    /// Read and deserialize the settings document at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Filesystem {
            op: "reading",
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }
}
