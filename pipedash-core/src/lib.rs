//! # pipedash-core
//!
//! Core library for pipedash - a terminal dashboard for a pipeline assistant.
//!
//! This library provides:
//! - Transcript parsing for the persisted conversation
//! - Column inference for schema-less report rows
//! - A gateway to the dashboard backend with per-operation failure handling
//! - The operation sequencer that owns the view model
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows in one direction:
//! - **Backend:** HTTP endpoints behind the [`gateway::Backend`] trait
//! - **Controller:** spawns gateway calls and applies their updates in order
//! - **View model:** the only state the presentation layer reads
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pipedash_core::{chart::ChartStore, Config, Controller, Gateway, HttpBackend};
//!
//! # async fn run() -> pipedash_core::Result<()> {
//! let config = Config::load()?;
//! let backend = HttpBackend::new(&config.server)?;
//! let charts = ChartStore::open(Config::chart_dir())?;
//!
//! let mut controller = Controller::new(
//!     Gateway::new(Arc::new(backend), charts),
//!     config.view.column_strategy,
//! );
//! controller.load_all();
//! controller.settle().await;
//! println!("{} messages", controller.model().conversation().len());
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use gateway::{Backend, Gateway, HttpBackend};
pub use sequencer::{Controller, Dispatch, IgnoreReason};
pub use types::*;
pub use view_model::ViewModel;

// Public modules
pub mod chart;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod schema;
pub mod sequencer;
pub mod transcript;
pub mod types;
pub mod view_model;
