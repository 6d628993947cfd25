// src/process/mod.rs

use std::{fs::File, io::Seek, path::Path, sync::Arc};

use arrow::{
    compute::concat_batches,
    csv::{reader::Format, ReaderBuilder},
    record_batch::RecordBatch,
};
use tracing::info;

use crate::error::{Error, Result};

const BATCH_SIZE: usize = 8192;

/// Load `path` as comma-delimited text with a header row and return the
/// leading `cols` columns and `rows` rows, in source order.
///
/// Column types are inferred from the data, so numeric and boolean cells come
/// back typed rather than as strings. Counts past the table's extent clamp to
/// what is available, so oversized requests return the whole table rather
/// than erroring.
pub fn extract(path: &Path, cols: usize, rows: usize) -> Result<RecordBatch> {
    let fs_err = |op: &'static str| {
        let path = path.to_path_buf();
        move |source| Error::Filesystem { op, path, source }
    };
    let parse_err = |source| Error::Parse {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(fs_err("opening"))?;

    // Two passes over the file: infer the schema, then parse against it.
    let format = Format::default().with_header(true);
    let (schema, _) = format
        .infer_schema(&mut file, None)
        .map_err(parse_err)?;
    file.rewind().map_err(fs_err("rewinding"))?;

    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_batch_size(BATCH_SIZE)
        .build(file)
        .map_err(parse_err)?;
    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(parse_err)?;
    let table = concat_batches(&schema, &batches).map_err(parse_err)?;

    let keep: Vec<usize> = (0..table.num_columns().min(cols)).collect();
    let truncated = table
        .project(&keep)
        .map_err(parse_err)?
        .slice(0, rows.min(table.num_rows()));

    info!(
        cols = truncated.num_columns(),
        rows = truncated.num_rows(),
        "extracted leading columns and rows"
    );
    Ok(truncated)
}
