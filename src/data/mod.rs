/// Data layer: core types, loading, filtering and export.
///
/// Architecture:
/// ```text
///  .csv / .xlsx / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  named columns, positional rows of Value
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  per-column specs → filtered Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  Table → .csv / .json / .parquet, text preview
///   └──────────┘
/// ```

pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
