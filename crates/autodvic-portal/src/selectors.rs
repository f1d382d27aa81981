//! The selector registry: every CSS selector, literal text pattern, and
//! timing constant the automation uses against the portal.
//!
//! The portal ships no API and no versioning; these strings are the whole
//! contract. When the portal's markup changes, this file (or a TOML
//! override) is the only thing that needs updating — flow code never embeds
//! a portal string.

use crate::error::{PortalError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete selector registry, namespaced by UI region.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Vehicle detail view
    pub vehicle: VehicleSelectors,
    /// Upload form fields
    pub form: FormSelectors,
    /// Defect-selection page
    pub issues: IssueSelectors,
    /// Upload dialog and flow buttons
    pub submission: SubmissionSelectors,
    /// Page qualification and tab detection
    pub navigation: NavigationSelectors,
    /// Timing constants
    pub timing: Timing,
}

impl SelectorConfig {
    /// Load a registry from a TOML file, validating it.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PortalError::Config(format!("read {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| PortalError::Config(format!("parse {}: {e}", path.display())))?;
        config.validate()?;
        tracing::info!(path = %path.display(), "loaded selector registry");
        Ok(config)
    }

    /// Validate that no required selector or text pattern is empty.
    ///
    /// A registry that fails here is a fatal configuration error; the
    /// automation refuses to start rather than operate partially.
    pub fn validate(&self) -> Result<()> {
        let required: &[(&str, &str)] = &[
            ("vehicle.main_container", &self.vehicle.main_container),
            ("vehicle.pill_items", &self.vehicle.pill_items),
            ("form.driver_input", &self.form.driver_input),
            ("form.transporter_input", &self.form.transporter_input),
            ("form.combobox_container", &self.form.combobox_container),
            ("form.combobox_option", &self.form.combobox_option),
            ("issues.category_container", &self.issues.category_container),
            ("issues.category_header", &self.issues.category_header),
            ("issues.subcategory", &self.issues.subcategory),
            ("issues.issue_element", &self.issues.issue_element),
            ("issues.issue_checkbox", &self.issues.issue_checkbox),
            ("issues.dropdown_expand", &self.issues.dropdown_expand),
            ("issues.defects_radio_name", &self.issues.defects_radio_name),
            ("submission.file_input", &self.submission.file_input),
            ("submission.radio_inputs", &self.submission.radio_inputs),
            ("submission.next_button_class", &self.submission.next_button_class),
            (
                "submission.upload_inspection_text",
                &self.submission.upload_inspection_text,
            ),
            (
                "submission.submit_inspection_text",
                &self.submission.submit_inspection_text,
            ),
            ("navigation.tab_radio_inputs", &self.navigation.tab_radio_inputs),
            (
                "navigation.inspections_tab_value",
                &self.navigation.inspections_tab_value,
            ),
            (
                "navigation.action_button_marker",
                &self.navigation.action_button_marker,
            ),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(PortalError::Config(format!("{field} cannot be empty")));
            }
        }
        Ok(())
    }
}

/// Selectors for the vehicle detail view.
///
/// Pill lookups are fixed positions, not semantic: the portal renders the
/// facts in a stable order and nothing else identifies them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleSelectors {
    /// Main info container; absence means the page structure changed
    pub main_container: String,
    /// Pill chip elements inside the container
    pub pill_items: String,
    /// Pill index holding `PLATE (STATE)`
    pub license_pill_index: usize,
    /// Pill index holding the VIN
    pub vin_pill_index: usize,
    /// Pill index holding the mileage text
    pub mileage_pill_index: usize,
    /// Pill index holding the asset type
    pub asset_type_pill_index: usize,
}

impl Default for VehicleSelectors {
    fn default() -> Self {
        Self {
            main_container: ".css-qodthi".to_string(),
            pill_items: "[class*=\"pill-item\"]".to_string(),
            license_pill_index: 1,
            vin_pill_index: 2,
            mileage_pill_index: 4,
            asset_type_pill_index: 5,
        }
    }
}

/// Selectors for the upload form fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSelectors {
    /// Driver name input
    pub driver_input: String,
    /// Fallback driver name input
    pub driver_input_fallback: String,
    /// Transporter ID input, used to verify the driver selection
    pub transporter_input: String,
    /// Combobox container wrapping the driver input
    pub combobox_container: String,
    /// Combobox input carrying the ARIA state
    pub combobox_input: String,
    /// Autocomplete option elements
    pub combobox_option: String,
    /// ARIA-label substring identifying the date input
    pub date_label: String,
    /// Native time input, when the portal renders one
    pub time_input: String,
    /// ARIA-label substring identifying a text-based time input
    pub time_label: String,
    /// Placeholder substring identifying a text-based time input
    pub time_placeholder: String,
}

impl Default for FormSelectors {
    fn default() -> Self {
        Self {
            driver_input: ".css-1geyss9 input".to_string(),
            driver_input_fallback: "#select-68".to_string(),
            transporter_input: "input[class=\"css-ys1hc6\"][placeholder=\"Transporter ID\"]"
                .to_string(),
            combobox_container: "[mdn-input-box]".to_string(),
            combobox_input: "input[role=\"combobox\"]".to_string(),
            combobox_option: "[role=\"option\"]".to_string(),
            date_label: "inspection date".to_string(),
            time_input: "input[type=\"time\"]".to_string(),
            time_label: "inspection time".to_string(),
            time_placeholder: "time".to_string(),
        }
    }
}

/// Selectors for the defect-selection page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueSelectors {
    /// Category section containers
    pub category_container: String,
    /// Category header text element within a section
    pub category_header: String,
    /// Subcategory header elements within a category
    pub subcategory: String,
    /// Issues container within a category
    pub issues_container: String,
    /// Fieldset wrapping the issue rows
    pub issues_fieldset: String,
    /// One issue row
    pub issue_element: String,
    /// Label text element within an issue row
    pub issue_label: String,
    /// Checkbox within an issue row
    pub issue_checkbox: String,
    /// Collapsible category dropdowns to expand
    pub dropdown_expand: String,
    /// Radio group name for the defects yes/no question
    pub defects_radio_name: String,
}

impl Default for IssueSelectors {
    fn default() -> Self {
        Self {
            category_container: ".css-ly5121".to_string(),
            category_header: ".css-1ropudr".to_string(),
            subcategory: ".css-86vfqe".to_string(),
            issues_container: ".css-z5nhup".to_string(),
            issues_fieldset: ".css-1ce8hpl".to_string(),
            issue_element: ".css-a8par6".to_string(),
            issue_label: "label > div".to_string(),
            issue_checkbox: "label > input[type=\"checkbox\"]".to_string(),
            dropdown_expand: ".css-1lne09z".to_string(),
            defects_radio_name: "defectsFoundQues".to_string(),
        }
    }
}

/// Selectors and text patterns for the upload dialog and flow buttons.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionSelectors {
    /// File-upload target element
    pub file_upload_element: String,
    /// Fallback link text for the file-upload target (lowercased)
    pub file_upload_link_text: String,
    /// The file input that changes when the operator picks a file
    pub file_input: String,
    /// All radio inputs
    pub radio_inputs: String,
    /// Radio value selecting a post-trip inspection
    pub post_trip_radio_value: String,
    /// Radio group name for the inspection type
    pub inspection_type_radio_name: String,
    /// Class carried by the next/review/submit buttons
    pub next_button_class: String,
    /// Upload button text (trimmed, lowercased)
    pub upload_inspection_text: String,
    /// Next button text when no defects follow (lowercased)
    pub next_review_submit_text: String,
    /// Next button text when the defects page follows (lowercased)
    pub next_select_defects_text: String,
    /// Final submit button text (lowercased)
    pub submit_inspection_text: String,
}

impl Default for SubmissionSelectors {
    fn default() -> Self {
        Self {
            file_upload_element: ".css-1b9zydf".to_string(),
            file_upload_link_text: "select file to upload".to_string(),
            file_input: "input[type=\"file\"]".to_string(),
            radio_inputs: "input[type=\"radio\"]".to_string(),
            post_trip_radio_value: "POST_TRIP_DVIC".to_string(),
            inspection_type_radio_name: "inspectionType".to_string(),
            next_button_class: "css-c6ayu0".to_string(),
            upload_inspection_text: "upload inspection".to_string(),
            next_review_submit_text: "next: review & submit".to_string(),
            next_select_defects_text: "next: select defects".to_string(),
            submit_inspection_text: "submit inspection".to_string(),
        }
    }
}

/// Selectors for page qualification and tab detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationSelectors {
    /// Class of the portal's native upload button
    pub upload_button_class: String,
    /// Exact (case-sensitive) text of the native upload button
    pub upload_button_text: String,
    /// Tab radio inputs
    pub tab_radio_inputs: String,
    /// Value of the inspections tab radio
    pub inspections_tab_value: String,
    /// Marker class of the injected action control
    pub action_button_marker: String,
}

impl Default for NavigationSelectors {
    fn default() -> Self {
        Self {
            upload_button_class: ".css-z4yfkz".to_string(),
            upload_button_text: "Upload inspection".to_string(),
            tab_radio_inputs: "input[type=\"radio\"][role=\"tab\"]".to_string(),
            inspections_tab_value: "INSPECTIONS".to_string(),
            action_button_marker: ".auto-dvic-container".to_string(),
        }
    }
}

/// Timing constants in milliseconds, plus attempt bounds.
///
/// Tune these when the portal responds slower or faster than the automation
/// expects; the flow never hardcodes a delay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Wait after opening the upload dialog
    pub dialog_load_ms: u64,
    /// Wait for the UI to settle after a fill
    pub ui_settle_ms: u64,
    /// Wait after a radio interaction
    pub radio_settle_ms: u64,
    /// Wait after expanding one category dropdown
    pub dropdown_expand_ms: u64,
    /// Wait for all dropdowns to finish expanding
    pub dropdown_settle_ms: u64,
    /// Wait between driver autocomplete interactions
    pub driver_dropdown_ms: u64,
    /// Wait after the operator picks a file
    pub file_process_ms: u64,
    /// Wait for a page transition
    pub page_load_ms: u64,
    /// Interval between URL/qualification polls
    pub check_interval_ms: u64,
    /// Base interval of the injection retry backoff
    pub inject_retry_ms: u64,
    /// Ceiling for overlay cleanup regardless of flow completion
    pub max_wait_ms: u64,
    /// Injection attempts before giving up
    pub inject_max_attempts: u32,
    /// Driver autocomplete attempts before prompting the operator
    pub driver_max_attempts: u32,
    /// Periodic re-checks after each navigation
    pub periodic_checks: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            dialog_load_ms: 1000,
            ui_settle_ms: 500,
            radio_settle_ms: 200,
            dropdown_expand_ms: 100,
            dropdown_settle_ms: 250,
            driver_dropdown_ms: 300,
            file_process_ms: 500,
            page_load_ms: 1000,
            check_interval_ms: 1000,
            inject_retry_ms: 500,
            max_wait_ms: 30_000,
            inject_max_attempts: 10,
            driver_max_attempts: 10,
            periodic_checks: 5,
        }
    }
}

impl Timing {
    /// Near-zero delays with the same attempt bounds. For tests and dry
    /// runs against a simulated page.
    #[must_use]
    pub fn instant() -> Self {
        Self {
            dialog_load_ms: 1,
            ui_settle_ms: 1,
            radio_settle_ms: 1,
            dropdown_expand_ms: 1,
            dropdown_settle_ms: 1,
            driver_dropdown_ms: 1,
            file_process_ms: 1,
            page_load_ms: 1,
            check_interval_ms: 1,
            inject_retry_ms: 1,
            max_wait_ms: 250,
            ..Self::default()
        }
    }

    /// Wait after opening the upload dialog.
    #[must_use]
    pub fn dialog_load(&self) -> Duration {
        Duration::from_millis(self.dialog_load_ms)
    }

    /// Wait for the UI to settle after a fill.
    #[must_use]
    pub fn ui_settle(&self) -> Duration {
        Duration::from_millis(self.ui_settle_ms)
    }

    /// Wait after a radio interaction.
    #[must_use]
    pub fn radio_settle(&self) -> Duration {
        Duration::from_millis(self.radio_settle_ms)
    }

    /// Wait after expanding one category dropdown.
    #[must_use]
    pub fn dropdown_expand(&self) -> Duration {
        Duration::from_millis(self.dropdown_expand_ms)
    }

    /// Wait for all dropdowns to finish expanding.
    #[must_use]
    pub fn dropdown_settle(&self) -> Duration {
        Duration::from_millis(self.dropdown_settle_ms)
    }

    /// Wait between driver autocomplete interactions.
    #[must_use]
    pub fn driver_dropdown(&self) -> Duration {
        Duration::from_millis(self.driver_dropdown_ms)
    }

    /// Wait after the operator picks a file.
    #[must_use]
    pub fn file_process(&self) -> Duration {
        Duration::from_millis(self.file_process_ms)
    }

    /// Wait for a page transition.
    #[must_use]
    pub fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }

    /// Interval between URL/qualification polls.
    #[must_use]
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    /// Injection retry delay for the given attempt number, linearly
    /// increasing and capped: interval × (1 + min(attempt, 3)).
    #[must_use]
    pub fn inject_retry_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.inject_retry_ms * u64::from(1 + attempt.min(3)))
    }

    /// Ceiling for overlay cleanup regardless of flow completion.
    #[must_use]
    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}
