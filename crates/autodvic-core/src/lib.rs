//! AutoDVIC Core - Foundation crate for the AutoDVIC automation tool.
//!
//! This crate provides the shared types, error handling, configuration
//! management, and report-field generation that all other AutoDVIC crates
//! depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared types (`VehicleInfo`, `InspectionSubmission`, `IssueId`)
//! - [`timefmt`] - Portal and report date/time formatting
//! - [`report`] - Flat field map for the fixed DVIC report template
//! - [`events`] - Inter-component message vocabulary
//! - [`store`] - Ephemeral JSON state store
//!
//! # Example
//!
//! ```rust
//! use autodvic_core::{timefmt, AppConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert!(!config.general.dev_mode);
//!
//! let date = timefmt::portal_date("2025-03-07")?;
//! assert_eq!(date, "03/07/2025");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod events;
pub mod report;
pub mod store;
pub mod timefmt;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, GeneralConfig, IdentityConfig, PortalConfig};
pub use error::{AutoDvicError, ConfigError, ConfigResult, Result};
pub use events::Message;
pub use report::{report_fields, report_filename, FieldValue};
pub use store::{StateStore, StoredState};
pub use types::{InspectionSubmission, InspectionType, IssueId, VehicleInfo};
