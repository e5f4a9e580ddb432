//! Combination errors

use thiserror::Error;

use crate::data::model::TableError;

/// Everything that can stop a combine request. None of these are retried:
/// the same input fails the same way, and a failed combine yields no table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombineError {
    /// Fewer than two tables selected.
    #[error("select at least two tables to combine ({selected} selected)")]
    InsufficientTables { selected: usize },

    /// An adjacent pair in the chain has no key pair configured.
    #[error("no join key configured between '{left}' and '{right}'")]
    MissingJoinKey { left: String, right: String },

    /// A step's left key is absent from the accumulated table, usually
    /// because it was projected out or renamed by an earlier step.
    #[error("join key '{column}' not found in the combined table while joining '{table}'")]
    JoinKeyNotFound { table: String, column: String },

    #[error("unsupported join mode '{0}' (expected inner, left, right or outer)")]
    UnsupportedJoinMode(String),

    #[error("no table named '{0}' has been loaded")]
    UnknownTable(String),

    #[error("table '{table}' has no column '{column}'")]
    UnknownColumn { table: String, column: String },

    #[error(transparent)]
    Table(#[from] TableError),
}
