use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use super::model::{Table, Value};

/// Distinct-value ceiling (exclusive) below which a column gets a
/// categorical filter instead of a free-text one.
pub const DEFAULT_CATEGORICAL_MAX_DISTINCT: usize = 20;

// ---------------------------------------------------------------------------
// Filter predicate: one spec per column
// ---------------------------------------------------------------------------

/// A per-column predicate. The variant is fixed when the spec is built and
/// is never re-derived from the data while filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSpec {
    /// Keep rows whose value is one of these.
    Categorical(BTreeSet<Value>),
    /// Keep rows whose text contains this pattern, ignoring case.
    Text(String),
}

impl FilterSpec {
    pub fn categorical<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        FilterSpec::Categorical(values.into_iter().map(Into::into).collect())
    }

    pub fn text(pattern: impl Into<String>) -> Self {
        FilterSpec::Text(pattern.into())
    }

    /// An empty selection or an empty pattern constrains nothing.
    pub fn is_active(&self) -> bool {
        match self {
            FilterSpec::Categorical(allowed) => !allowed.is_empty(),
            FilterSpec::Text(pattern) => !pattern.is_empty(),
        }
    }
}

/// Column name → spec. A map, so a column carries at most one spec.
pub type FilterSet = BTreeMap<String, FilterSpec>;

/// A spec resolved against a concrete table.
enum Predicate {
    Members(usize, BTreeSet<Value>),
    Contains(usize, String),
}

impl Predicate {
    fn matches(&self, row: &[Value]) -> bool {
        match self {
            Predicate::Members(idx, allowed) => allowed.contains(&row[*idx]),
            Predicate::Contains(idx, needle) => {
                row[*idx].as_text().to_lowercase().contains(needle.as_str())
            }
        }
    }
}

/// Return a new table holding the rows of `table` that pass every active
/// spec.
///
/// * Specs naming a column the table lacks are ignored.
/// * Inactive specs (nothing selected, empty pattern) are ignored.
/// * Row order is preserved.
pub fn apply_filters(table: &Table, specs: &FilterSet) -> Table {
    let predicates: Vec<Predicate> = specs
        .iter()
        .filter(|(_, spec)| spec.is_active())
        .filter_map(|(col, spec)| {
            let idx = table.column_index(col)?;
            Some(match spec {
                FilterSpec::Categorical(allowed) => Predicate::Members(idx, allowed.clone()),
                FilterSpec::Text(pattern) => Predicate::Contains(idx, pattern.to_lowercase()),
            })
        })
        .collect();

    if predicates.is_empty() {
        return table.clone();
    }

    let rows = table
        .rows()
        .iter()
        .filter(|row| predicates.iter().all(|p| p.matches(row)))
        .cloned()
        .collect();

    let filtered = table.with_rows(rows);
    debug!(
        "filter '{}': kept {} of {} rows ({} active specs)",
        table.name(),
        filtered.len(),
        table.len(),
        predicates.len()
    );
    filtered
}

// ---------------------------------------------------------------------------
// Column kind: which spec shape a column should be offered
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    /// Few distinct values: pick from `options`.
    Categorical { options: BTreeSet<Value> },
    /// Many (or zero) distinct values, numeric columns included: type a pattern.
    FreeText,
}

/// Classify a column: more than zero and fewer than `max_distinct` distinct
/// non-null values is categorical, anything else free text.
pub fn column_kind(table: &Table, column: &str, max_distinct: usize) -> ColumnKind {
    let options = table.distinct_values(column);
    if !options.is_empty() && options.len() < max_distinct {
        ColumnKind::Categorical { options }
    } else {
        ColumnKind::FreeText
    }
}

/// "Showing X of Y rows."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSummary {
    pub shown: usize,
    pub total: usize,
}

pub fn summarize(original: &Table, filtered: &Table) -> FilterSummary {
    FilterSummary {
        shown: filtered.len(),
        total: original.len(),
    }
}

impl std::fmt::Display for FilterSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "showing {} of {} rows", self.shown, self.total)
    }
}
