//! Issue definitions for the DVIC checklist.
//!
//! Maps internal issue IDs to the exact defect text, category, and
//! subcategory shown on the fleet portal's defect-selection page. The
//! automation's checkbox resolution depends on these strings matching the
//! live portal verbatim.

pub mod catalog;

pub use catalog::{
    lookup, validate_catalog, Category, IssueMapping, CATEGORY_BY_ID, EXPECTED_ISSUE_IDS,
    TEXT_BY_ID,
};
