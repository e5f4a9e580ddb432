/// Combination pipeline: plan a join chain over registry tables, then fold it.
///
/// ```text
///   TableRegistry + selection
///        │
///        ▼
///   ┌──────────┐
///   │   plan    │  validate names, columns, key pairs → JoinPlan
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ executor  │  left-to-right hash joins, collision suffixes → Table
///   └──────────┘
/// ```

pub mod error;
pub mod executor;
pub mod plan;

pub use error::CombineError;
pub use executor::{JoinExecutor, execute};
pub use plan::{ColumnSelection, JoinKeyPair, JoinKeys, JoinMode, JoinPlan, build_plan};
