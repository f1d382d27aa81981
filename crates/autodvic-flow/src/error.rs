//! Error types for the submission automation.

use autodvic_portal::PortalError;
use thiserror::Error;

/// An issue that could not be matched to a checkbox on the defects page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedIssue {
    /// Exact portal text that was searched for
    pub text: String,
    /// Category the issue should be filed under
    pub category: String,
    /// Subcategory the issue should be filed under
    pub subcategory: String,
}

/// Errors raised while driving the portal.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A required element could not be located. The message names the
    /// element so the operator knows what the portal stopped rendering.
    #[error("{what} not found - the portal page layout may have changed")]
    ElementMissing {
        /// What was being looked for
        what: String,
    },

    /// The issue catalog failed its consistency check; nothing was
    /// attempted against the portal.
    #[error("issue catalog is inconsistent ({} problems), refusing to start", .0.len())]
    CatalogInvalid(Vec<String>),

    /// The manual driver-selection wait was cancelled before the operator
    /// confirmed a driver.
    #[error("driver selection cancelled before verification")]
    DriverSelectionCancelled,

    /// Underlying page operation failed.
    #[error(transparent)]
    Portal(#[from] PortalError),

    /// Submission data failed validation.
    #[error(transparent)]
    Core(#[from] autodvic_core::AutoDvicError),
}

impl FlowError {
    /// Shorthand for a missing-element abort.
    pub fn missing(what: impl Into<String>) -> Self {
        Self::ElementMissing { what: what.into() }
    }
}

/// Result type for flow operations.
pub type Result<T> = std::result::Result<T, FlowError>;
