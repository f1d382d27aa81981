//! Submission automation for the fleet portal.
//!
//! Drives the portal's dynamically rendered UI through the `PortalPage`
//! seam: extracting vehicle facts, keeping the action control injected on
//! qualifying pages, and walking an inspection submission through the
//! multi-step upload form. Every selector and delay comes from the
//! registry; nothing here embeds a portal string.

pub mod driver;
pub mod error;
pub mod flow;
pub mod injector;
pub mod strategies;
pub mod vehicle;

#[cfg(test)]
pub(crate) mod testing;

pub use driver::resolve_driver;
pub use error::{FlowError, Result, UnresolvedIssue};
pub use flow::{FlowOutcome, SubmissionFlow};
pub use injector::{is_vehicle_detail_url, ButtonInjector, InjectionState};
pub use vehicle::extract_vehicle_info;
