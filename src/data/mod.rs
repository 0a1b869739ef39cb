/// Data layer: core types, loading, filtering, and ranking.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse source → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  location → reservation → marks threshold
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  summary  │  top-N rows, describe() statistics
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod summary;
