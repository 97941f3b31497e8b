use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::{debug, info};
use parquet::arrow::ArrowWriter;
use serde_json::{Map, Value as JsonValue};
use tempfile::NamedTempFile;

use super::error::{DatasetError, Result};
use super::format::Format;
use super::model::{Table, Value};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Write `table` to `path`, creating or replacing it. Format follows the
/// extension, as in [`super::loader::load`].
///
/// The data goes to a temporary file next to `path` that is renamed over it
/// only once everything has been written, so a failed save never leaves a
/// truncated output behind.
pub fn save(table: &Table, path: &Path) -> Result<()> {
    let format = Format::from_path(path);
    debug!("saving {} as {format:?}", path.display());

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = temp_file_in(dir).map_err(|e| DatasetError::write(path, e))?;

    let written = match format {
        Format::Csv => write_csv(table, tmp.as_file_mut()),
        Format::Json => write_json(table, tmp.as_file_mut()),
        Format::Parquet => write_parquet(table, tmp.as_file_mut()),
    };
    written.map_err(|e| DatasetError::write(path, format!("{e:#}")))?;

    // an overwritten file keeps its mode
    if let Ok(existing) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .map_err(|e| DatasetError::write(path, e))?;
    }
    tmp.persist(path)
        .map_err(|e| DatasetError::write(path, e.error))?;

    info!("wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Temporary sibling of the output. On Unix it is opened with mode 0666 so
/// the process umask applies, as for a file created directly.
fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".season-filter-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

// ---------------------------------------------------------------------------
// CSV writer
// ---------------------------------------------------------------------------

/// Header row followed by one line per record, no index column.
fn write_csv(table: &Table, file: &mut File) -> anyhow::Result<()> {
    if table.columns.is_empty() {
        return Ok(());
    }
    let mut writer = csv::Writer::from_writer(file);
    writer
        .write_record(&table.columns)
        .context("writing CSV header")?;

    for (row_no, row) in table.rows.iter().enumerate() {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .with_context(|| format!("writing CSV record {}", row_no + 1))?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON writer
// ---------------------------------------------------------------------------

/// Records-oriented array, keys in column order. Object keys must be
/// unique, so a header naming a column twice is rejected.
fn write_json(table: &Table, file: &mut File) -> anyhow::Result<()> {
    let mut seen = HashSet::new();
    if let Some(dup) = table.columns.iter().find(|c| !seen.insert(c.as_str())) {
        bail!("duplicate column '{dup}' cannot be written as JSON");
    }

    let records: Vec<JsonValue> = table
        .rows
        .iter()
        .map(|row| {
            let obj: Map<String, JsonValue> = table
                .columns
                .iter()
                .cloned()
                .zip(row.iter().map(value_to_json))
                .collect();
            JsonValue::Object(obj)
        })
        .collect();

    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, &records).context("serializing JSON")?;
    out.flush().context("flushing JSON")?;
    Ok(())
}

/// Non-finite floats have no JSON representation and become `null`.
fn value_to_json(val: &Value) -> JsonValue {
    match val {
        Value::Integer(i) => JsonValue::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Null => JsonValue::Null,
    }
}

// ---------------------------------------------------------------------------
// Parquet writer
// ---------------------------------------------------------------------------

fn write_parquet(table: &Table, file: &mut File) -> anyhow::Result<()> {
    if table.columns.is_empty() {
        bail!("cannot write a table without columns as parquet");
    }

    let mut fields = Vec::with_capacity(table.columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.columns.len());
    for (idx, name) in table.columns.iter().enumerate() {
        let data_type = infer_column_type(table.rows.iter().map(|r| &r[idx]));
        debug!("column '{name}' -> {data_type:?}");
        arrays.push(build_column(table, idx, &data_type));
        fields.push(Field::new(name, data_type, true));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// One Arrow type per column: integers widen to floats when mixed, any other
/// mix falls back to text. Nulls don't constrain the type.
fn infer_column_type<'a>(values: impl Iterator<Item = &'a Value>) -> DataType {
    let mut inferred: Option<DataType> = None;
    for v in values {
        let ty = match v {
            Value::Null => continue,
            Value::Integer(_) => DataType::Int64,
            Value::Float(_) => DataType::Float64,
            Value::Bool(_) => DataType::Boolean,
            Value::String(_) => DataType::Utf8,
        };
        inferred = Some(match (inferred, ty) {
            (None, ty) => ty,
            (Some(a), b) if a == b => a,
            (Some(DataType::Int64), DataType::Float64)
            | (Some(DataType::Float64), DataType::Int64) => DataType::Float64,
            _ => DataType::Utf8,
        });
    }
    inferred.unwrap_or(DataType::Utf8)
}

fn build_column(table: &Table, idx: usize, data_type: &DataType) -> ArrayRef {
    let cells = table.rows.iter().map(|r| &r[idx]);
    match data_type {
        DataType::Int64 => Arc::new(cells.map(Value::as_i64).collect::<Int64Array>()),
        DataType::Float64 => Arc::new(cells.map(Value::as_f64).collect::<Float64Array>()),
        DataType::Boolean => Arc::new(
            cells
                .map(|v| match v {
                    Value::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<BooleanArray>(),
        ),
        _ => Arc::new(
            cells
                .map(|v| (!v.is_null()).then(|| v.to_string()))
                .collect::<StringArray>(),
        ),
    }
}
