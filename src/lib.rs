//! Filter and combine marketing spreadsheets.
//!
//! Tables (campaigns, ad sets, ads, sales, or any other name) live in a
//! [`TableRegistry`]. Each can be narrowed with [`apply_filters`], and any
//! two or more can be chained together with [`build_plan`] and [`execute`].

pub mod combine;
pub mod data;
pub mod registry;
pub mod settings;

pub use combine::{
    ColumnSelection, CombineError, JoinExecutor, JoinKeyPair, JoinKeys, JoinMode, JoinPlan,
    build_plan, execute,
};
pub use data::filter::{ColumnKind, FilterSet, FilterSpec, apply_filters, column_kind};
pub use data::model::{Row, Table, TableError, Value};
pub use registry::{TableRegistry, TableSlot};
pub use settings::Settings;
