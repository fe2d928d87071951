//! # Solstat - solar array status monitor
//!
//! A small daemon that keeps an eye on a residential solar installation and
//! shows its health on a few indicator lamps.
//!
//! ## Features
//!
//! - **Weather gate**: only judges the array while the sun is up and the sky
//!   is clear enough to produce
//! - **Two status sources**: the latest record in the local store, or the
//!   vendor's cloud API with every sample appended to the store
//! - **Staleness check**: flags arrays that still claim to be healthy but
//!   have not reported within the threshold
//! - **Retention**: prunes records past a fixed window on a persisted cadence
//! - **Configuration**: YAML-based configuration with validation
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `store`: Historical record store (SQLite, in-memory)
//! - `weather`: Daylight/weather gate with bounded retries
//! - `vendor`: Vendor cloud API client
//! - `source`: Status sources feeding the monitor
//! - `indicator`: Lamp outputs (sysfs GPIO, log-only)
//! - `monitor`: The reconciliation loop, verdict table and retention

pub mod config;
pub mod error;
pub mod indicator;
pub mod logging;
pub mod monitor;
pub mod source;
pub mod store;
pub mod vendor;
pub mod weather;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, SolstatError};
pub use monitor::{CycleReport, Monitor};
