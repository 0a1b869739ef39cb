/// egui views over [`AppState`](crate::state::AppState).
///
/// ```text
///   ┌───────────────────────── top_bar ─────────────────────────┐
///   │ File ▸ Open… / Export reports… / Save settings…   status   │
///   ├──────────────┬─────────────────────────────────────────────┤
///   │ side_panel   │ results                                     │
///   │  marks       │  per file: tables (table), summary,         │
///   │  reservation │  marks distribution (plot), save button     │
///   │  category    │                                             │
///   │  location    │                                             │
///   │  columns     │                                             │
///   └──────────────┴─────────────────────────────────────────────┘
/// ```

pub mod panels;
pub mod plot;
pub mod results;
pub mod table;
