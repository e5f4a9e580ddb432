//! Join execution: fold a [`JoinPlan`] left to right into one table.
//!
//! Each step is a hash join. The incoming (right) table is indexed by key,
//! except for right joins, where the accumulated (left) table is indexed so
//! output can follow right-side order.
//!
//! Duplicate keys on both sides multiply: 2 left rows and 3 right rows
//! sharing a key produce 6 output rows. Nothing bounds this growth beyond a
//! logged warning, so callers should cap input sizes themselves.

use std::collections::HashMap;

use log::{debug, warn};

use crate::data::model::{Row, Table, Value};

use super::error::CombineError;
use super::plan::{JoinMode, JoinPlan, JoinStep};

/// Result-to-input row ratio above which a step logs a fan-out warning.
pub const DEFAULT_FAN_OUT_WARN_FACTOR: usize = 10;

#[derive(Debug, Clone)]
pub struct JoinExecutor {
    fan_out_warn_factor: usize,
}

impl Default for JoinExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl JoinExecutor {
    pub fn new() -> Self {
        JoinExecutor {
            fan_out_warn_factor: DEFAULT_FAN_OUT_WARN_FACTOR,
        }
    }

    /// Warn when a step's output exceeds `factor` times its larger input.
    /// A factor of 0 turns the warning off.
    pub fn with_fan_out_warning(mut self, factor: usize) -> Self {
        self.fan_out_warn_factor = factor;
        self
    }

    /// Run every step of `plan`. Inputs are never modified; on error no
    /// table is produced.
    pub fn execute(&self, plan: &JoinPlan<'_>) -> Result<Table, CombineError> {
        let mut accumulator = plan.first.materialize()?;

        for step in &plan.steps {
            let next = self.join_step(&accumulator, step)?;
            debug!(
                "joined '{}' ({} rows) {} '{}' ({} rows) -> {} rows",
                accumulator.name(),
                accumulator.len(),
                step.mode,
                step.right.name(),
                step.right.source.len(),
                next.len()
            );
            accumulator = next;
        }

        let name = plan.table_names().join("+");
        Ok(accumulator.renamed(name))
    }

    fn join_step(&self, left: &Table, step: &JoinStep<'_>) -> Result<Table, CombineError> {
        let right = step.right.source;

        let left_key = left
            .column_index(&step.keys.left)
            .ok_or_else(|| CombineError::JoinKeyNotFound {
                table: step.left_name.clone(),
                column: step.keys.left.clone(),
            })?;
        let right_key = right
            .column_index(&step.keys.right)
            .ok_or_else(|| CombineError::UnknownColumn {
                table: right.name().to_string(),
                column: step.keys.right.clone(),
            })?;

        let layout = OutputLayout::new(left, step, left_key, right_key)?;
        let pairs = match_rows(left, left_key, right, right_key, step.mode);

        let rows: Vec<Row> = pairs
            .into_iter()
            .map(|(l, r)| layout.build_row(left, right, l, r))
            .collect();

        if self.fans_out(rows.len(), left.len(), right.len()) {
            warn!(
                "join of '{}' and '{}' on {} = {} fanned out to {} rows from inputs of {} and {}",
                step.left_name,
                right.name(),
                step.keys.left,
                step.keys.right,
                rows.len(),
                left.len(),
                right.len()
            );
        }

        Ok(Table::new(left.name(), layout.columns, rows)?)
    }

    fn fans_out(&self, output: usize, left: usize, right: usize) -> bool {
        if self.fan_out_warn_factor == 0 {
            return false;
        }
        let largest_input = left.max(right).max(1);
        output > largest_input.saturating_mul(self.fan_out_warn_factor)
    }
}

/// Fold `plan` with the default executor.
pub fn execute(plan: &JoinPlan<'_>) -> Result<Table, CombineError> {
    JoinExecutor::new().execute(plan)
}

// ---------------------------------------------------------------------------
// Row matching
// ---------------------------------------------------------------------------

/// Index the non-null keys of `table` by value.
fn index_by_key(table: &Table, key: usize) -> HashMap<&Value, Vec<usize>> {
    let mut index: HashMap<&Value, Vec<usize>> = HashMap::new();
    for (i, row) in table.rows().iter().enumerate() {
        let k = &row[key];
        if !k.is_null() {
            index.entry(k).or_default().push(i);
        }
    }
    index
}

/// Pair up row indices according to `mode`. `None` stands for the
/// all-null side of an unmatched row. Null keys never match.
fn match_rows(
    left: &Table,
    left_key: usize,
    right: &Table,
    right_key: usize,
    mode: JoinMode,
) -> Vec<(Option<usize>, Option<usize>)> {
    let mut pairs = Vec::new();

    if mode == JoinMode::Right {
        let index = index_by_key(left, left_key);
        for (r, row) in right.rows().iter().enumerate() {
            match index.get(&row[right_key]) {
                Some(matches) => pairs.extend(matches.iter().map(|&l| (Some(l), Some(r)))),
                None => pairs.push((None, Some(r))),
            }
        }
        return pairs;
    }

    let index = index_by_key(right, right_key);
    let mut right_matched = vec![false; right.len()];
    for (l, row) in left.rows().iter().enumerate() {
        match index.get(&row[left_key]) {
            Some(matches) => {
                for &r in matches {
                    right_matched[r] = true;
                    pairs.push((Some(l), Some(r)));
                }
            }
            None if mode.keeps_left() => pairs.push((Some(l), None)),
            None => {}
        }
    }

    if mode.keeps_right() {
        pairs.extend(
            right_matched
                .iter()
                .enumerate()
                .filter(|(_, matched)| !**matched)
                .map(|(r, _)| (None, Some(r))),
        );
    }
    pairs
}

// ---------------------------------------------------------------------------
// Output columns
// ---------------------------------------------------------------------------

/// Where each output column comes from.
#[derive(Debug, Clone, Copy)]
enum Source {
    Left(usize),
    Right(usize),
    /// Shared key name: left value, else right value.
    Coalesced(usize, usize),
}

struct OutputLayout {
    columns: Vec<String>,
    sources: Vec<Source>,
}

impl OutputLayout {
    /// Left columns then the right table's projected columns. A key with the
    /// same name on both sides is emitted once; any other shared name gets a
    /// `_<table>` suffix on both copies.
    fn new(
        left: &Table,
        step: &JoinStep<'_>,
        left_key: usize,
        right_key: usize,
    ) -> Result<Self, CombineError> {
        let right = step.right.source;
        let right_name = right.name();
        let shared_key = step.keys.left == step.keys.right;

        let right_cols: Vec<(usize, &String)> = step
            .right
            .columns
            .iter()
            .filter(|c| !(shared_key && **c == step.keys.right))
            .map(|c| {
                right
                    .column_index(c)
                    .map(|i| (i, c))
                    .ok_or_else(|| CombineError::UnknownColumn {
                        table: right_name.to_string(),
                        column: c.clone(),
                    })
            })
            .collect::<Result<_, _>>()?;

        let collides = |name: &str| -> bool {
            !(shared_key && name == step.keys.left)
                && left.has_column(name)
                && right_cols.iter().any(|(_, c)| c.as_str() == name)
        };

        let mut columns = Vec::with_capacity(left.width() + right_cols.len());
        let mut sources = Vec::with_capacity(columns.capacity());

        for (i, col) in left.columns().iter().enumerate() {
            if collides(col.as_str()) {
                columns.push(format!("{col}_{}", step.left_name));
            } else {
                columns.push(col.clone());
            }
            if shared_key && i == left_key {
                sources.push(Source::Coalesced(i, right_key));
            } else {
                sources.push(Source::Left(i));
            }
        }

        for (i, col) in &right_cols {
            if collides(col.as_str()) {
                columns.push(format!("{col}_{right_name}"));
            } else {
                columns.push((*col).clone());
            }
            sources.push(Source::Right(*i));
        }

        Ok(OutputLayout { columns, sources })
    }

    fn build_row(&self, left: &Table, right: &Table, l: Option<usize>, r: Option<usize>) -> Row {
        let left_row = l.map(|i| &left.rows()[i]);
        let right_row = r.map(|i| &right.rows()[i]);
        let pick = |row: Option<&Row>, idx: usize| -> Value {
            row.map(|row| row[idx].clone()).unwrap_or(Value::Null)
        };

        self.sources
            .iter()
            .map(|source| match *source {
                Source::Left(i) => pick(left_row, i),
                Source::Right(i) => pick(right_row, i),
                Source::Coalesced(li, ri) => match pick(left_row, li) {
                    Value::Null => pick(right_row, ri),
                    v => v,
                },
            })
            .collect()
    }
}
