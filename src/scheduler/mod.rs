//! Allocation engine and load metrics.
//!
//! # Engine
//!
//! `Engine` binds the allocators to a configuration and a calendar
//! position. The scheduling operations in [`crate::operations`] drive it.
//!
//! # KPI
//!
//! `LoadKpi` measures how evenly due cards are spread: maximum and mean
//! daily load, standard deviation, and days over a limit.

mod engine;
mod kpi;

pub use engine::Engine;
pub use kpi::LoadKpi;
