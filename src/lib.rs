//! Due-date allocation for spaced repetition.
//!
//! Given review cards whose next interval has been derived from a memory
//! model, decides the concrete day each card (or each group of sibling
//! cards from one note) becomes due, respecting per-card feasibility
//! windows, weekday preferences, and daily load targets.
//!
//! # Modules
//!
//! - **`allocation`**: Fuzz windows, load-balanced sampling, sibling gap
//!   maximization, capacity-constrained bulk placement
//! - **`scheduler`**: `Engine` facade binding allocators to a context, and
//!   `LoadKpi` load metrics
//! - **`operations`**: Reschedule, postpone/advance, sibling dispersal,
//!   flattening, busy/break spreading over a `Collection`
//! - **`dispatching`**: Priority rules and the rule engine ordering cards
//! - **`models`**: `Item`, `DayRange`, `Assignment`, `DayLoad`,
//!   `PreferenceWeights`, `Card`
//! - **`memory`**: Forgetting curves (exponential and power-law)
//! - **`config`**: Serde configuration and the per-call `Context`
//! - **`validation`**: Input integrity checks before allocation
//! - **`worker`**: Cancellation, progress, background batches
//!
//! # Quick Start
//!
//! ```
//! use chrono::NaiveDate;
//! use u_due::config::{Context, SchedulerConfig};
//! use u_due::models::{Card, Timeline};
//! use u_due::operations::{flatten, MemoryCollection};
//! use u_due::scheduler::Engine;
//! use u_due::worker::BatchControl;
//!
//! let timeline = Timeline::new(0, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
//! let engine = Engine::new(Context::new(SchedulerConfig::default(), timeline));
//!
//! let cards = (1..=8).map(|id| Card::review(id, 10, 10).with_memory(10.0, 5.0));
//! let mut collection = MemoryCollection::with_cards(cards);
//!
//! let report = flatten(&engine, &mut collection, 5, 30, &mut BatchControl::new()).unwrap();
//! assert_eq!(report.changed, 3);
//! ```
//!
//! # References
//!
//! - Ye (2022–2024), "FSRS: Free Spaced Repetition Scheduler"
//! - Hoos & Stützle (2004), "Stochastic Local Search"
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

pub mod allocation;
pub mod config;
pub mod dispatching;
pub mod error;
pub mod memory;
pub mod models;
pub mod operations;
pub mod scheduler;
pub mod validation;
pub mod worker;

pub use error::{Error, Result};
