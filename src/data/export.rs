use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::ArrowWriter;
use serde_json::{Map, Value as JsonValue};

use super::model::{Table, Value};

/// Formats the exporter can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Parquet,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "parquet" | "pq" => Ok(ExportFormat::Parquet),
            other => bail!("Unsupported export extension: .{other}"),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Parquet => "parquet",
        }
    }
}

/// `<stem>.<ext>`, e.g. `campaigns_filtered.csv`.
pub fn export_file_name(stem: &str, format: ExportFormat) -> PathBuf {
    PathBuf::from(format!("{stem}.{}", format.extension()))
}

/// Write `table` to `path`, picking the format from the extension.
pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    match ExportFormat::from_path(path)? {
        ExportFormat::Csv => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            write_csv(table, file)?;
        }
        ExportFormat::Json => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            write_json(table, file)?;
        }
        ExportFormat::Parquet => write_parquet(table, path)?,
    }
    info!(
        "wrote '{}' to {}: {} rows, {} columns",
        table.name(),
        path.display(),
        table.len(),
        table.width()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV / JSON
// ---------------------------------------------------------------------------

/// Header row, then one record per row. Nulls are empty cells.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(table.columns()).context("writing CSV header")?;
    for row in table.rows() {
        wtr.write_record(row.iter().map(|v| v.as_text().into_owned()))
            .context("writing CSV row")?;
    }
    wtr.flush().context("flushing CSV")?;
    Ok(())
}

/// Records-oriented JSON array, the same shape the loader reads.
pub fn write_json<W: Write>(table: &Table, writer: W) -> Result<()> {
    let records: Vec<JsonValue> = table
        .rows()
        .iter()
        .map(|row| {
            let obj: Map<String, JsonValue> = table
                .columns()
                .iter()
                .cloned()
                .zip(row.iter().map(value_to_json))
                .collect();
            JsonValue::Object(obj)
        })
        .collect();
    serde_json::to_writer_pretty(writer, &records).context("writing JSON")?;
    Ok(())
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::Integer(i) => JsonValue::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Null => JsonValue::Null,
    }
}

// ---------------------------------------------------------------------------
// Arrow / Parquet
// ---------------------------------------------------------------------------

/// Arrow type for a column: Int64 if every non-null value is an integer,
/// Float64 if all are numeric, Boolean if all are booleans, Utf8 otherwise.
fn infer_column_type(table: &Table, idx: usize) -> DataType {
    let mut ints = true;
    let mut numbers = true;
    let mut bools = true;
    for row in table.rows() {
        match &row[idx] {
            Value::Null => {}
            Value::Integer(_) => bools = false,
            Value::Float(_) => {
                ints = false;
                bools = false;
            }
            Value::Bool(_) => {
                ints = false;
                numbers = false;
            }
            Value::Text(_) => return DataType::Utf8,
        }
    }
    if ints && numbers && !bools {
        DataType::Int64
    } else if numbers && !bools {
        DataType::Float64
    } else if bools && !ints {
        DataType::Boolean
    } else {
        // All null (or empty): keep it as text.
        DataType::Utf8
    }
}

/// Convert a table into a single Arrow record batch.
pub fn to_record_batch(table: &Table) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(table.width());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.width());

    for (idx, name) in table.columns().iter().enumerate() {
        let data_type = infer_column_type(table, idx);
        let cells = table.rows().iter().map(|r| &r[idx]);
        let array: ArrayRef = match data_type {
            DataType::Int64 => Arc::new(
                cells
                    .map(|v| match v {
                        Value::Integer(i) => Some(*i),
                        _ => None,
                    })
                    .collect::<Int64Array>(),
            ),
            DataType::Float64 => Arc::new(
                cells
                    .map(|v| match v {
                        Value::Integer(i) => Some(*i as f64),
                        Value::Float(f) => Some(*f),
                        _ => None,
                    })
                    .collect::<Float64Array>(),
            ),
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
        };
        fields.push(Field::new(name, array.data_type().clone(), true));
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    if arrays.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    RecordBatch::try_new(schema, arrays).context("building record batch")
}

pub fn write_parquet(table: &Table, path: &Path) -> Result<()> {
    let batch = to_record_batch(table)?;
    let file =
        std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Render the first `rows` rows as a text grid.
pub fn preview(table: &Table, rows: usize) -> Result<String> {
    let head = table.with_rows(table.rows().iter().take(rows).cloned().collect());
    let batch = to_record_batch(&head)?;
    let grid = arrow::util::pretty::pretty_format_batches(&[batch])
        .context("formatting preview")?;
    Ok(grid.to_string())
}
