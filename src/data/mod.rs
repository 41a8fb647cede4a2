/// Data layer: core types, loading, preparation, and exploration.
///
/// Architecture:
/// ```text
///  .csv file / base64 content string
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  typed named columns, numeric/categorical split
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  prepare  │  impute → encode → scale → PreparedMatrix
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  explore  │  correlation / group-mean bar series
///   └──────────┘
/// ```

pub mod explore;
pub mod loader;
pub mod model;
pub mod prepare;
