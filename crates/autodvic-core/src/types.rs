//! Shared types used across the AutoDVIC application.
//!
//! This module defines the core domain types: the vehicle facts scraped from
//! the portal, the inspection submission assembled by the operator, and the
//! validated issue identifier newtype.

use crate::error::AutoDvicError;
use crate::timefmt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

/// Vehicle facts extracted from the portal's vehicle detail view.
///
/// Fields are plain strings; an empty string means the source text did not
/// match the expected pattern. "Valid mileage", "mileage unknown", and
/// "unparseable" are three distinct outcomes and only the first yields a
/// non-empty `odo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleInfo {
    /// License plate
    pub lic: String,
    /// License plate state code
    pub lic_state: String,
    /// Vehicle identification number
    pub vin: String,
    /// Odometer reading in miles; empty when unknown or unparseable
    pub odo: String,
    /// Asset type label; empty when the mileage pill was unparseable
    pub asset_type: String,
}

impl VehicleInfo {
    /// Check whether every field is empty (nothing was extracted).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lic.is_empty()
            && self.lic_state.is_empty()
            && self.vin.is_empty()
            && self.odo.is_empty()
            && self.asset_type.is_empty()
    }
}

/// Whether the inspection was performed before or after the trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InspectionType {
    /// Pre-trip inspection
    #[serde(alias = "Pre-Trip", alias = "PRE")]
    Pre,
    /// Post-trip inspection
    #[serde(alias = "Post-Trip", alias = "POST")]
    Post,
}

impl InspectionType {
    /// True for post-trip inspections, which require flipping the portal's
    /// inspection-type radio away from its pre-trip default.
    #[must_use]
    pub fn is_post(&self) -> bool {
        matches!(self, Self::Post)
    }

    /// Short lowercase token used in report filenames.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pre => "pre",
            Self::Post => "post",
        }
    }
}

impl fmt::Display for InspectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pre => write!(f, "Pre-Trip"),
            Self::Post => write!(f, "Post-Trip"),
        }
    }
}

/// Newtype for inspectable-defect identifiers with validation.
///
/// Issue IDs follow the `{side}_{component}_{sequence}` scheme, e.g.
/// `2_ftire_1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IssueId(String);

impl IssueId {
    /// Create a new `IssueId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID doesn't match the `{side}_{component}_{sequence}`
    /// format.
    pub fn new(id: impl Into<String>) -> Result<Self, AutoDvicError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<(), AutoDvicError> {
        static ISSUE_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = ISSUE_REGEX
            .get_or_init(|| Regex::new(r"^\d+_[a-z]+_\d+$").expect("valid regex"));

        if regex.is_match(id) {
            Ok(())
        } else {
            Err(AutoDvicError::Validation(format!(
                "invalid issue ID: must match side_component_sequence, got '{id}'"
            )))
        }
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for IssueId {
    type Error = AutoDvicError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IssueId> for String {
    fn from(id: IssueId) -> Self {
        id.0
    }
}

/// One inspection submission assembled by the operator.
///
/// This is the primary input of the submission flow engine. The
/// satisfactory-condition flag and a non-empty issue set are mutually
/// exclusive; [`InspectionSubmission::validate`] must pass before any
/// portal interaction is attempted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionSubmission {
    /// Driver (delivery associate) full name
    pub da_name: String,
    /// Transporter ID used to verify the driver autocomplete selection
    pub transporter_id: String,
    /// Pre- or post-trip
    pub inspection_type: InspectionType,
    /// Inspection date, ISO `YYYY-MM-DD`
    pub insp_date: String,
    /// Inspection time, 24-hour `HH:MM`
    pub insp_time: String,
    /// Vehicle is in satisfactory condition (no defects)
    pub satisfy_cond: bool,
    /// Selected defect issue IDs; empty when `satisfy_cond` is set
    #[serde(default)]
    pub issues: BTreeSet<IssueId>,
    /// DSP code printed on the report
    #[serde(default)]
    pub dsp: String,
    /// Station code printed on the report
    #[serde(default)]
    pub station: String,
    /// Inspection location printed on the report
    #[serde(default)]
    pub insp_loc: String,
}

impl InspectionSubmission {
    /// True when at least one defect issue is selected.
    #[must_use]
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Validate the submission for internal consistency.
    ///
    /// # Errors
    /// Returns error if the satisfactory flag and the issue set contradict
    /// each other, if the driver name is empty, or if the date/time strings
    /// are malformed.
    pub fn validate(&self) -> Result<(), AutoDvicError> {
        if self.da_name.trim().is_empty() {
            return Err(AutoDvicError::Validation(
                "driver name cannot be empty".to_string(),
            ));
        }

        if self.satisfy_cond && self.has_issues() {
            return Err(AutoDvicError::Validation(
                "vehicle cannot be marked as satisfactory when issues are selected".to_string(),
            ));
        }

        if !self.satisfy_cond && !self.has_issues() {
            return Err(AutoDvicError::Validation(
                "select at least one issue or mark the vehicle as satisfactory".to_string(),
            ));
        }

        // Both formatters reject malformed input
        timefmt::portal_date(&self.insp_date)?;
        timefmt::portal_time(&self.insp_time)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_submission() -> InspectionSubmission {
        InspectionSubmission {
            da_name: "Jane Driver".to_string(),
            transporter_id: "A1B2C3D4".to_string(),
            inspection_type: InspectionType::Pre,
            insp_date: "2025-03-07".to_string(),
            insp_time: "13:05".to_string(),
            satisfy_cond: true,
            issues: BTreeSet::new(),
            dsp: String::new(),
            station: String::new(),
            insp_loc: String::new(),
        }
    }

    #[test]
    fn test_issue_id_valid() {
        let valid = vec!["1_lights_1", "2_ftire_3", "5_windsh_2", "12_brakes_10"];
        for id in valid {
            assert!(IssueId::new(id).is_ok(), "Failed for: {id}");
        }
    }

    #[test]
    fn test_issue_id_invalid() {
        let invalid = vec!["", "lights_1", "1_Lights_1", "1_lights", "1-lights-1", "a_b_c"];
        for id in invalid {
            assert!(IssueId::new(id).is_err(), "Should fail for: {id}");
        }
    }

    #[test]
    fn test_inspection_type_aliases() {
        let t: InspectionType = serde_json::from_str("\"Post-Trip\"").expect("alias parses");
        assert!(t.is_post());
        let t: InspectionType = serde_json::from_str("\"pre\"").expect("lowercase parses");
        assert!(!t.is_post());
    }

    #[test]
    fn test_satisfactory_submission_validates() {
        assert!(base_submission().validate().is_ok());
    }

    #[test]
    fn test_satisfactory_with_issues_rejected() {
        let mut sub = base_submission();
        sub.issues.insert(IssueId::new("2_ftire_1").expect("valid id"));
        assert!(sub.validate().is_err());
    }

    #[test]
    fn test_neither_satisfactory_nor_issues_rejected() {
        let mut sub = base_submission();
        sub.satisfy_cond = false;
        assert!(sub.validate().is_err());
    }

    #[test]
    fn test_issues_without_satisfactory_validates() {
        let mut sub = base_submission();
        sub.satisfy_cond = false;
        sub.issues.insert(IssueId::new("2_ftire_1").expect("valid id"));
        assert!(sub.validate().is_ok());
    }

    #[test]
    fn test_empty_driver_name_rejected() {
        let mut sub = base_submission();
        sub.da_name = "  ".to_string();
        assert!(sub.validate().is_err());
    }

    #[test]
    fn test_malformed_date_rejected() {
        let mut sub = base_submission();
        sub.insp_date = "03/07/2025".to_string();
        assert!(sub.validate().is_err());
    }

    #[test]
    fn test_vehicle_info_is_empty() {
        assert!(VehicleInfo::default().is_empty());
        let info = VehicleInfo {
            vin: "1FTBW3XM0PKA00001".to_string(),
            ..VehicleInfo::default()
        };
        assert!(!info.is_empty());
    }
}
