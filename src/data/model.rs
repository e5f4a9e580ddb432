use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common spreadsheet dtypes.
/// Used as a `BTreeSet` member (filter options) and as a `HashMap` key
/// (join build side), so `Value` must be `Ord` and `Hash`.
#[derive(Debug, Clone)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord/Hash so the three agree, including for NaN --

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Text(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            // Whole floats keep their ".0" so they stay distinct from integers.
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text representation used for substring filtering and CSV export.
    /// `Null` is the empty string.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Value::Text(s) => Cow::Borrowed(s.as_str()),
            Value::Null => Cow::Borrowed(""),
            other => Cow::Owned(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – a named, ordered row collection
// ---------------------------------------------------------------------------

/// One row, positionally aligned with [`Table::columns`].
pub type Row = Vec<Value>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("table '{table}' has duplicate column '{column}'")]
    DuplicateColumn { table: String, column: String },

    #[error("table '{table}': row {row} has {found} values but there are {expected} columns")]
    RaggedRow {
        table: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("table '{table}' has no column '{column}'")]
    UnknownColumn { table: String, column: String },
}

/// An immutable named dataset. Filtering, projection and joins all build new
/// tables; nothing mutates one in place after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Build a table, checking that column names are unique and that every
    /// row is as wide as the header.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Row>,
    ) -> Result<Self, TableError> {
        let name = name.into();

        let mut seen = BTreeSet::new();
        for col in &columns {
            if !seen.insert(col.as_str()) {
                return Err(TableError::DuplicateColumn {
                    table: name,
                    column: col.clone(),
                });
            }
        }

        if let Some((row, bad)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            return Err(TableError::RaggedRow {
                table: name,
                row,
                expected: columns.len(),
                found: bad.len(),
            });
        }

        Ok(Table {
            name,
            columns,
            rows,
        })
    }

    /// A table with no columns and no rows.
    pub fn empty(name: impl Into<String>) -> Self {
        Table {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Iterate one column top to bottom.
    pub fn column_values<'a>(
        &'a self,
        column: &str,
    ) -> Option<impl Iterator<Item = &'a Value> + 'a> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }

    /// Sorted set of the non-null values in a column. Empty when the column
    /// does not exist.
    pub fn distinct_values(&self, column: &str) -> BTreeSet<Value> {
        self.column_values(column)
            .map(|vals| vals.filter(|v| !v.is_null()).cloned().collect())
            .unwrap_or_default()
    }

    /// Keep only `columns`, in the given order.
    pub fn project(&self, columns: &[String]) -> Result<Table, TableError> {
        let indices = columns
            .iter()
            .map(|c| {
                self.column_index(c).ok_or_else(|| TableError::UnknownColumn {
                    table: self.name.clone(),
                    column: c.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rows = self
            .rows
            .iter()
            .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
            .collect();

        Table::new(self.name.clone(), columns.to_vec(), rows)
    }

    /// Same data under another name.
    pub fn renamed(&self, name: impl Into<String>) -> Table {
        Table {
            name: name.into(),
            columns: self.columns.clone(),
            rows: self.rows.clone(),
        }
    }

    /// A table with this table's name and schema but different rows. The
    /// rows must come from a table with the same schema.
    pub(crate) fn with_rows(&self, rows: Vec<Row>) -> Table {
        debug_assert!(rows.iter().all(|r| r.len() == self.columns.len()));
        Table {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rejects_duplicate_columns() {
        let err = Table::new("t", cols(&["id", "id"]), vec![]).unwrap_err();
        assert_eq!(
            err,
            TableError::DuplicateColumn {
                table: "t".into(),
                column: "id".into()
            }
        );
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let err = Table::new(
            "t",
            cols(&["a", "b"]),
            vec![vec![Value::Integer(1), Value::Integer(2)], vec![Value::Integer(3)]],
        )
        .unwrap_err();
        assert!(matches!(err, TableError::RaggedRow { row: 1, expected: 2, found: 1, .. }));
    }

    #[test]
    fn test_empty_table_is_valid() {
        let t = Table::empty("nothing");
        assert!(t.is_empty());
        assert_eq!(t.width(), 0);
        assert!(Table::new("zero_rows", cols(&["a"]), vec![]).is_ok());
    }

    #[test]
    fn test_project_reorders_and_rejects_unknown() {
        let t = Table::new(
            "t",
            cols(&["a", "b", "c"]),
            vec![vec![Value::Integer(1), "x".into(), Value::Null]],
        )
        .unwrap();

        let p = t.project(&cols(&["c", "a"])).unwrap();
        assert_eq!(p.columns(), &cols(&["c", "a"])[..]);
        assert_eq!(p.rows()[0], vec![Value::Null, Value::Integer(1)]);

        let err = t.project(&cols(&["zzz"])).unwrap_err();
        assert!(matches!(err, TableError::UnknownColumn { .. }));
    }

    #[test]
    fn test_distinct_values_skip_nulls() {
        let t = Table::new(
            "t",
            cols(&["k"]),
            vec![
                vec!["b".into()],
                vec![Value::Null],
                vec!["a".into()],
                vec!["b".into()],
            ],
        )
        .unwrap();
        let distinct: Vec<_> = t.distinct_values("k").into_iter().collect();
        assert_eq!(distinct, vec![Value::from("a"), Value::from("b")]);
        assert!(t.distinct_values("missing").is_empty());
    }

    #[test]
    fn test_equality_is_raw() {
        assert_ne!(Value::Integer(1), Value::Float(1.0));
        assert_ne!(Value::from("1"), Value::Integer(1));
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_eq!(Value::Null.as_text(), "");
        assert_eq!(Value::Float(2.5).as_text(), "2.5");
    }

    #[test]
    fn test_whole_floats_print_with_fraction() {
        assert_eq!(Value::Float(100.0).to_string(), "100.0");
        assert_eq!(Value::Float(-0.0).to_string(), "-0.0");
        assert_eq!(Value::Integer(100).to_string(), "100");
        assert_eq!(Value::Float(f64::INFINITY).to_string(), "inf");
    }
}
