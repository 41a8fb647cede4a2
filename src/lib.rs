//! TabLab: interactive tabular data explorer and linear-model trainer.
//!
//! The GUI lives in [`app`] / [`ui`]; everything underneath (ingestion,
//! preparation, exploration, modeling) is plain library code so it can be
//! exercised without a window.

pub mod app;
pub mod color;
pub mod data;
pub mod model;
pub mod state;
pub mod ui;
