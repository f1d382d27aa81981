//! Portal access layer for AutoDVIC.
//!
//! Holds the selector registry (the automation's entire contract with the
//! portal's versionless UI), the `PortalPage` DOM seam, predicate-based
//! waiting, on-page notices, and the CDP-backed implementation.

pub mod cdp;
pub mod error;
pub mod notice;
pub mod page;
pub mod selectors;
pub mod session;
pub mod wait;

pub use error::{PortalError, Result};
pub use notice::{Notice, NoticeLevel};
pub use page::{ElementId, PortalPage};
pub use selectors::{SelectorConfig, Timing};
pub use session::PortalBrowser;
pub use wait::{wait_until, WaitOutcome};
