/// Data layer: table model, loading, season filtering and saving.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table (schema from header)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  drop one season_end_year → new Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  writer   │  temp file + rename → .csv / .json / .parquet
///   └──────────┘
/// ```

pub mod error;
pub mod filter;
pub mod format;
pub mod loader;
pub mod model;
pub mod writer;

pub use filter::{filter, seasons_before, team_history};
pub use loader::load;
pub use writer::save;
