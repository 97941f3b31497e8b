use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::{DatasetError, Result};
use super::format::Format;
use super::model::{Record, Table, Value, SEASON_END_YEAR};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a standings table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row naming the columns (also the fallback)
/// * `.json`    – `[{ "season_end_year": 2023, "team": "Arsenal", ... }, ...]`
/// * `.parquet` – flat columns of strings, ints, floats or bools
///
/// If a `season_end_year` column is present every cell in it must be an
/// integer.
pub fn load(path: &Path) -> Result<Table> {
    let format = Format::from_path(path);
    debug!("loading {} as {format:?}", path.display());

    let table = match format {
        Format::Csv => load_csv(path)?,
        Format::Json => load_json(path)?,
        Format::Parquet => load_parquet(path)?,
    };
    check_season_column(path, &table)?;

    info!(
        "loaded {} rows x {} columns from {}",
        table.len(),
        table.columns.len(),
        path.display()
    );
    Ok(table)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => DatasetError::NotFound {
            path: path.to_path_buf(),
        },
        _ => DatasetError::Read {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn check_season_column(path: &Path, table: &Table) -> Result<()> {
    let Some(idx) = table.column_index(SEASON_END_YEAR) else {
        return Ok(());
    };
    for (row_no, row) in table.rows.iter().enumerate() {
        if row[idx].as_i64().is_none() {
            return Err(DatasetError::parse(
                path,
                format!(
                    "record {}: {SEASON_END_YEAR} '{}' is not an integer",
                    row_no + 1,
                    row[idx]
                ),
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Every record must have as many fields as the header.
fn load_csv(path: &Path) -> Result<Table> {
    let file = open(path)?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| csv_error(path, e))?;
        rows.push(record.iter().map(Value::parse).collect::<Record>());
    }

    Ok(Table::new(columns, rows))
}

fn csv_error(path: &Path, err: csv::Error) -> DatasetError {
    if err.is_io_error() {
        if let csv::ErrorKind::Io(source) = err.into_kind() {
            return DatasetError::Read {
                path: path.to_path_buf(),
                source,
            };
        }
        return DatasetError::parse(path, "I/O error while reading CSV");
    }
    DatasetError::parse(path, err.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`). The key order of
/// the first record fixes the column order; every record must carry the
/// same keys.
fn load_json(path: &Path) -> Result<Table> {
    let file = open(path)?;
    let root: JsonValue = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| DatasetError::parse(path, format!("parsing JSON: {e}")))?;

    let records = root
        .as_array()
        .ok_or_else(|| DatasetError::parse(path, "expected top-level JSON array"))?;

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| DatasetError::parse(path, format!("record {i} is not a JSON object")))?;

        if i == 0 {
            columns = obj.keys().cloned().collect();
        } else if obj.len() != columns.len() {
            return Err(DatasetError::parse(
                path,
                format!(
                    "record {i} has {} fields, expected {}",
                    obj.len(),
                    columns.len()
                ),
            ));
        }

        let row = columns
            .iter()
            .map(|col| {
                obj.get(col).map(json_to_value).ok_or_else(|| {
                    DatasetError::parse(path, format!("record {i} is missing '{col}'"))
                })
            })
            .collect::<Result<Record>>()?;
        rows.push(row);
    }

    Ok(Table::new(columns, rows))
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Flat Parquet schema; nested columns are rejected.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| DatasetError::parse(path, format!("reading parquet metadata: {e}")))?;

    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();

    let reader = builder
        .build()
        .map_err(|e| DatasetError::parse(path, format!("building parquet reader: {e}")))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| DatasetError::parse(path, format!("reading record batch: {e}")))?;

        for row in 0..batch.num_rows() {
            let record = batch
                .columns()
                .iter()
                .zip(&columns)
                .map(|(col, name)| {
                    extract_value(col, row)
                        .map_err(|msg| DatasetError::parse(path, format!("column '{name}': {msg}")))
                })
                .collect::<Result<Record>>()?;
            rows.push(record);
        }
    }

    Ok(Table::new(columns, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &ArrayRef, row: usize) -> std::result::Result<Value, String> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => Value::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => Value::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => Value::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => Value::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => Value::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => Value::Bool(col.as_boolean().value(row)),
        other => return Err(format!("unsupported column type {other:?}")),
    };
    Ok(value)
}
