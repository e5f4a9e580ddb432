use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
};
use arrow::datatypes::DataType;
use calamine::{DataType as Cell, Reader, open_workbook_auto};
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Row, Table, Value};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
    Parquet,
    Excel,
}

impl SourceFormat {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "json" => Ok(SourceFormat::Json),
            "parquet" | "pq" => Ok(SourceFormat::Parquet),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(SourceFormat::Excel),
            other => bail!("Unsupported file extension: .{other}"),
        }
    }
}

/// Load a file into a table called `name`.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, cell types guessed
/// * `.xlsx` / `.xls` / `.ods` – first worksheet, first row is the header
/// * `.json`    – `[{ "col": value, ... }, ...]`
/// * `.parquet` – flat scalar columns
pub fn load_table(name: &str, path: &Path) -> Result<Table> {
    let format = SourceFormat::from_path(path)?;
    let table = match format {
        SourceFormat::Csv => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            read_csv(name, file)?
        }
        SourceFormat::Json => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            read_json(name, file)?
        }
        SourceFormat::Parquet => load_parquet(name, path)?,
        SourceFormat::Excel => load_excel(name, path)?,
    };

    info!(
        "loaded '{}' from {}: {} rows, {} columns",
        name,
        path.display(),
        table.len(),
        table.width()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Read delimited text with a header row. Every cell's type is guessed.
pub fn read_csv<R: Read>(name: &str, reader: R) -> Result<Table> {
    let mut reader = csv::Reader::from_reader(reader);
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let row: Row = record.iter().map(guess_value_type).collect();
        rows.push(row);
    }

    Table::new(name, columns, rows).context("building table from CSV")
}

fn guess_value_type(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    if s == "true" || s == "false" {
        return Value::Bool(s == "true");
    }
    Value::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "id": 1, "name": "Summer Sale", "budget": 1500.0 },
///   ...
/// ]
/// ```
///
/// Columns appear in order of first occurrence; keys missing from a record
/// are null.
pub fn read_json<R: Read>(name: &str, reader: R) -> Result<Table> {
    let root: JsonValue = serde_json::from_reader(reader).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map(json_to_value).unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    Table::new(name, columns, rows).context("building table from JSON")
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Excel loader
// ---------------------------------------------------------------------------

fn load_excel(name: &str, path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("opening workbook {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheets")?
        .context("reading first worksheet")?;

    let mut sheet_rows = range.rows();
    let columns: Vec<String> = match sheet_rows.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(i, cell)| match cell {
                Cell::Empty => format!("Unnamed: {i}"),
                other => other.to_string(),
            })
            .collect(),
        None => return Ok(Table::empty(name)),
    };

    let rows = sheet_rows
        .map(|cells| cells.iter().map(cell_to_value).collect())
        .collect();

    Table::new(name, columns, rows).context("building table from worksheet")
}

/// Spreadsheets store every number as a float, so whole numbers that fit an
/// `i64` come back as integers and join against ids read from CSV.
fn cell_to_value(cell: &Cell) -> Value {
    match cell {
        Cell::Int(i) => Value::Integer(*i),
        Cell::Float(f) if is_whole(*f) => Value::Integer(*f as i64),
        Cell::Float(f) => Value::Float(*f),
        Cell::String(s) if s.is_empty() => Value::Null,
        Cell::String(s) => Value::Text(s.clone()),
        Cell::Bool(b) => Value::Bool(*b),
        Cell::Empty => Value::Null,
        other => Value::Text(other.to_string()),
    }
}

fn is_whole(f: f64) -> bool {
    // 2^63 itself does not fit, hence the strict upper bound.
    f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of flat scalar columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). Nested or exotic column types are
/// carried as text.
fn load_parquet(name: &str, path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        for row in 0..batch.num_rows() {
            let values: Row = batch
                .columns()
                .iter()
                .map(|col| extract_value(col, row))
                .collect();
            rows.push(values);
        }
    }

    Table::new(name, columns, rows).context("building table from parquet")
}

// -- Arrow helpers --

/// Extract a single scalar from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => Value::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| Value::Integer(a.value(row) as i64))
            .unwrap_or(Value::Null),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| Value::Integer(a.value(row)))
            .unwrap_or(Value::Null),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| Value::Float(a.value(row) as f64))
            .unwrap_or(Value::Null),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| Value::Float(a.value(row)))
            .unwrap_or(Value::Null),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| Value::Bool(a.value(row)))
            .unwrap_or(Value::Null),
        _ => arrow::util::display::array_value_to_string(col, row)
            .map(Value::Text)
            .unwrap_or(Value::Null),
    }
}
