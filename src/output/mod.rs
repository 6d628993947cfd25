// src/output/mod.rs

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use arrow::{
    array::{ArrayRef, Int64Array},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use tracing::info;

use crate::error::{Error, Result};

/// Closed set of serializations for the output artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Destination stem for a source file: `<output_dir>/<stem>_modified`, with
/// the extension split off at the last dot so `data` and `archive.tar.gz`
/// both derive sensible names.
pub fn modified_stem(source: &Path, output_dir: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    output_dir.join(format!("{stem}_modified"))
}

/// Serialize `table` as `format` at `<dest_stem>.<ext>` and return the
/// written path.
///
/// The format string is validated before any I/O, and the table is encoded
/// in memory ahead of the single write, so a failed save never leaves a
/// partial file behind.
pub fn save(table: &RecordBatch, dest_stem: &Path, format: &str) -> Result<PathBuf> {
    let format: OutputFormat = format.parse()?;

    // Append the extension by hand; `with_extension` would clobber anything
    // after the last dot already in the stem.
    let mut path = dest_stem.as_os_str().to_owned();
    path.push(".");
    path.push(format.extension());
    let path = PathBuf::from(path);

    let buf = match format {
        OutputFormat::Csv => encode_csv(table)?,
        OutputFormat::Json => encode_json(table)?,
    };
    fs::write(&path, buf).map_err(|source| Error::Filesystem {
        op: "writing",
        path: path.clone(),
        source,
    })?;

    info!(file = %path.display(), rows = table.num_rows(), "saved output");
    Ok(path)
}

/// Prepend a 0-based row index with an empty header name, the shape pandas
/// gives CSV exports.
fn with_index_column(
    table: &RecordBatch,
) -> std::result::Result<RecordBatch, arrow::error::ArrowError> {
    let index: ArrayRef = Arc::new(Int64Array::from_iter_values(0..table.num_rows() as i64));

    let mut fields = vec![Arc::new(Field::new("", DataType::Int64, false))];
    fields.extend(table.schema().fields().iter().cloned());
    let mut columns = vec![index];
    columns.extend(table.columns().iter().cloned());

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
}

fn encode_csv(table: &RecordBatch) -> Result<Vec<u8>> {
    let encode_err = |source| Error::Encode {
        format: "csv",
        source,
    };
    let indexed = with_index_column(table).map_err(encode_err)?;

    let mut buf = Vec::new();
    let mut writer = arrow::csv::WriterBuilder::new()
        .with_header(true)
        .build(&mut buf);
    writer.write(&indexed).map_err(encode_err)?;
    drop(writer);
    Ok(buf)
}

fn encode_json(table: &RecordBatch) -> Result<Vec<u8>> {
    let encode_err = |source| Error::Encode {
        format: "json",
        source,
    };

    let mut buf = Vec::new();
    let mut writer = arrow::json::ArrayWriter::new(&mut buf);
    writer.write(table).map_err(encode_err)?;
    writer.finish().map_err(encode_err)?;
    drop(writer);
    Ok(buf)
}
