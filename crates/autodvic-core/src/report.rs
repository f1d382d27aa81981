//! Flat field map for the fixed DVIC report template.
//!
//! The report template (a fillable PDF) is filled by an external
//! collaborator; this module's only obligation is to produce the flat
//! key→value map matching the template's named fields, plus the derived
//! download filename.

use crate::error::AutoDvicError;
use crate::timefmt::{self, Meridiem};
use crate::types::{InspectionSubmission, InspectionType, VehicleInfo};
use std::collections::BTreeMap;

/// One value in the report field map: either a text field or a checkbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Text field contents
    Text(String),
    /// Checkbox state
    Checked(bool),
}

impl FieldValue {
    fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
}

/// Build the complete field map for one submission.
///
/// Validates the submission first; a submission that is both satisfactory
/// and carries issues (or neither) never reaches the template.
///
/// # Errors
/// Returns error if the submission fails validation or the date/time
/// strings are malformed.
pub fn report_fields(
    submission: &InspectionSubmission,
    vehicle: &VehicleInfo,
) -> Result<BTreeMap<String, FieldValue>, AutoDvicError> {
    submission.validate()?;

    let mut fields = BTreeMap::new();

    fields.insert("name".to_string(), FieldValue::text(&submission.da_name));
    fields.insert("dsp".to_string(), FieldValue::text(&submission.dsp));
    fields.insert("asset_type".to_string(), FieldValue::text(&vehicle.asset_type));
    fields.insert("vin".to_string(), FieldValue::text(&vehicle.vin));
    fields.insert("lic".to_string(), FieldValue::text(&vehicle.lic));
    fields.insert("lic_state".to_string(), FieldValue::text(&vehicle.lic_state));
    fields.insert("odo".to_string(), FieldValue::text(&vehicle.odo));
    fields.insert("insp_loc".to_string(), FieldValue::text(&submission.insp_loc));
    fields.insert("station".to_string(), FieldValue::text(&submission.station));

    fields.insert(
        "insp_date".to_string(),
        FieldValue::text(timefmt::portal_date(&submission.insp_date)?),
    );

    let (time, meridiem) = timefmt::report_time(&submission.insp_time)?;
    fields.insert("insp_time".to_string(), FieldValue::text(time));
    fields.insert(
        "insp_time_am".to_string(),
        FieldValue::Checked(meridiem == Meridiem::Am),
    );
    fields.insert(
        "insp_time_pm".to_string(),
        FieldValue::Checked(meridiem == Meridiem::Pm),
    );

    let is_pre = submission.inspection_type == InspectionType::Pre;
    fields.insert("insp_type_pre".to_string(), FieldValue::Checked(is_pre));
    fields.insert("insp_type_post".to_string(), FieldValue::Checked(!is_pre));

    for issue in &submission.issues {
        fields.insert(issue.as_str().to_string(), FieldValue::Checked(true));
    }

    fields.insert(
        "satisfy_cond".to_string(),
        FieldValue::Checked(submission.satisfy_cond),
    );

    // Signature line carries the driver name
    fields.insert("signature".to_string(), FieldValue::text(&submission.da_name));

    Ok(fields)
}

/// Derive the download filename for a filled report,
/// `<sanitized name>_<type>_DVIC_<MM-DD-YYYY>.pdf`.
///
/// # Errors
/// Returns error if the submission date is malformed.
pub fn report_filename(submission: &InspectionSubmission) -> Result<String, AutoDvicError> {
    let name: String = submission
        .da_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let date = timefmt::filename_date(&submission.insp_date)?;
    Ok(format!(
        "{name}_{}_DVIC_{date}.pdf",
        submission.inspection_type.as_str()
    ))
}
