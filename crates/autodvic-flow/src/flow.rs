//! The submission flow engine.
//!
//! Drives one inspection submission through the portal's multi-step upload
//! form: open the dialog, point the operator at the file picker, set the
//! inspection type, resolve the driver, fill date/time, answer the defects
//! question, and either submit directly or walk the defect-selection page.
//!
//! Safety invariant: an issue that cannot be matched to a portal checkbox
//! is never dropped. The flow halts before submission, reports every
//! unmatched issue, and leaves the portal on the defect-selection page for
//! the operator - it never partially submits with unknown state.

use crate::driver::resolve_driver;
use crate::error::{FlowError, Result, UnresolvedIssue};
use crate::strategies::select_radio;
use autodvic_core::{InspectionSubmission, Message};
use autodvic_issues::catalog::{self, IssueMapping};
use autodvic_portal::page::{
    find_button_by_class_and_text, find_button_by_text, find_input_by_label, ElementId,
    PortalPage,
};
use autodvic_portal::selectors::SelectorConfig;
use autodvic_portal::wait::{wait_until, WaitOutcome};
use autodvic_portal::{Notice, PortalError};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// How a submission flow ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The inspection was submitted
    Submitted,
    /// Dev mode replaced the final submit click with a notice
    SkippedDevMode,
    /// Unmatched issues were reported and the portal was left on the
    /// defect-selection page for the operator to finish
    ManualCompletion {
        /// The issues that could not be matched
        unresolved: Vec<UnresolvedIssue>,
    },
}

/// One submission flow over a portal page.
pub struct SubmissionFlow<'a> {
    page: &'a dyn PortalPage,
    config: &'a SelectorConfig,
    dev_mode: bool,
    events: UnboundedSender<Message>,
    cancel: CancellationToken,
}

impl<'a> SubmissionFlow<'a> {
    pub fn new(
        page: &'a dyn PortalPage,
        config: &'a SelectorConfig,
        dev_mode: bool,
        events: UnboundedSender<Message>,
    ) -> Self {
        Self {
            page,
            config,
            dev_mode,
            events,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an external cancellation token for the unbounded waits.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the flow. Every abort is paired with a `submissionError` event
    /// and an on-page notice explaining what to do next.
    pub async fn run(&self, submission: &InspectionSubmission) -> Result<FlowOutcome> {
        match self.execute(submission).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                tracing::error!(error = %err, "submission flow aborted");
                let _ = self.events.send(Message::SubmissionError {
                    error: err.to_string(),
                });
                let _ = self
                    .page
                    .show_notice(&Notice::error("Submission failed", err.to_string()))
                    .await;
                Err(err)
            }
        }
    }

    async fn execute(&self, submission: &InspectionSubmission) -> Result<FlowOutcome> {
        // Both checks run before any portal interaction
        submission.validate()?;
        catalog::validate_catalog().map_err(FlowError::CatalogInvalid)?;

        let timing = &self.config.timing;
        let sub = &self.config.submission;

        tracing::info!(
            inspection_type = %submission.inspection_type,
            issues = submission.issues.len(),
            "starting submission flow"
        );

        let upload = find_button_by_text(self.page, &sub.upload_inspection_text)
            .await?
            .ok_or_else(|| FlowError::missing("upload inspection button"))?;
        self.page.click(upload).await?;
        tokio::time::sleep(timing.dialog_load()).await;

        let file_target = self.find_file_target().await?;
        self.await_file_selection(file_target).await?;
        tokio::time::sleep(timing.file_process()).await;

        if submission.inspection_type.is_post() {
            self.select_post_trip_radio().await?;
        }
        tokio::time::sleep(timing.ui_settle()).await;

        // Driver resolution failures are logged and surfaced, not fatal:
        // the operator can still fix the field before the final submit.
        if let Err(err) = resolve_driver(
            self.page,
            &self.config.form,
            timing,
            &submission.da_name,
            &submission.transporter_id,
            &self.cancel,
        )
        .await
        {
            tracing::error!(error = %err, "driver name fill failed");
        }

        self.fill_date(&submission.insp_date).await?;
        self.fill_time(&submission.insp_time).await?;
        self.answer_defects_question(submission.has_issues()).await?;
        tokio::time::sleep(timing.ui_settle()).await;

        let next = find_button_by_class_and_text(
            self.page,
            &sub.next_button_class,
            &[
                sub.next_review_submit_text.as_str(),
                sub.next_select_defects_text.as_str(),
            ],
        )
        .await?
        .ok_or_else(|| FlowError::missing("next button"))?;
        self.page.click(next).await?;

        if submission.has_issues() {
            self.complete_defects_page(submission).await
        } else {
            tokio::time::sleep(timing.page_load()).await;
            self.final_submit().await
        }
    }

    async fn find_file_target(&self) -> Result<ElementId> {
        let sub = &self.config.submission;
        if let Some(el) = self.page.query(&sub.file_upload_element).await? {
            return Ok(el);
        }
        // Fall back to the upload link by its text
        for el in self.page.query_all("a").await? {
            if self.page.text(el).await?.trim().to_lowercase() == sub.file_upload_link_text {
                return Ok(el);
            }
        }
        Err(FlowError::missing("file upload element"))
    }

    /// Spotlight the file-picker target and wait for the operator to pick
    /// a file. The decoration is cleaned up on the first of file selection
    /// or the hard ceiling; the wait itself continues until selection or
    /// cancellation.
    async fn await_file_selection(&self, file_target: ElementId) -> Result<()> {
        let timing = &self.config.timing;
        let page = self.page;
        let file_input = self.config.submission.file_input.as_str();

        self.page
            .spotlight(
                file_target,
                "Please select the DVIC PDF that was just downloaded",
            )
            .await?;

        let selected = move || async move {
            match page.query(file_input).await? {
                Some(input) => Ok::<bool, PortalError>(!page.value(input).await?.is_empty()),
                None => Ok(false),
            }
        };

        let outcome = wait_until(
            selected,
            timing.dropdown_expand(),
            Some(timing.max_wait()),
            &self.cancel,
        )
        .await?;

        // Ceiling cleanup is unconditional; a stuck overlay must never
        // outlive the wait bound.
        self.page.clear_spotlight().await?;

        match outcome {
            WaitOutcome::Satisfied => Ok(()),
            WaitOutcome::TimedOut => {
                tracing::debug!("overlay ceiling reached, still waiting for file selection");
                match wait_until(selected, timing.dropdown_expand(), None, &self.cancel).await? {
                    WaitOutcome::Satisfied => Ok(()),
                    _ => Err(FlowError::Portal(PortalError::Cancelled(
                        "file selection".to_string(),
                    ))),
                }
            }
            WaitOutcome::Cancelled => Err(FlowError::Portal(PortalError::Cancelled(
                "file selection".to_string(),
            ))),
        }
    }

    async fn select_post_trip_radio(&self) -> Result<()> {
        let sub = &self.config.submission;
        let mut post_trip = None;

        for radio in self.page.query_all(&sub.radio_inputs).await? {
            let value = self.page.attribute(radio, "value").await?.unwrap_or_default();
            let name = self.page.attribute(radio, "name").await?.unwrap_or_default();
            if value == sub.post_trip_radio_value && name == sub.inspection_type_radio_name {
                post_trip = Some(radio);
                break;
            }
        }

        let Some(radio) = post_trip else {
            tracing::error!("post-trip radio button not found");
            return Ok(());
        };

        if select_radio(self.page, radio, &self.config.timing).await? {
            tracing::debug!("post-trip inspection type selected");
        } else {
            tracing::warn!("post-trip radio still unchecked after all strategies");
        }
        Ok(())
    }

    async fn fill_date(&self, insp_date: &str) -> Result<()> {
        let Some(input) = find_input_by_label(self.page, &self.config.form.date_label).await?
        else {
            tracing::warn!("inspection date input not found");
            return Ok(());
        };

        let formatted = autodvic_core::timefmt::portal_date(insp_date)?;
        self.page.set_value(input, &formatted).await?;
        tracing::debug!(date = %formatted, "filled inspection date");
        tokio::time::sleep(self.config.timing.ui_settle()).await;
        Ok(())
    }

    async fn fill_time(&self, insp_time: &str) -> Result<()> {
        let form = &self.config.form;

        let mut time_input = self.page.query(&form.time_input).await?;
        if time_input.is_none() {
            for el in self.page.query_all("input[type=\"text\"]").await? {
                let label = self
                    .page
                    .attribute(el, "aria-label")
                    .await?
                    .unwrap_or_default()
                    .to_lowercase();
                let placeholder = self
                    .page
                    .attribute(el, "placeholder")
                    .await?
                    .unwrap_or_default()
                    .to_lowercase();
                let id = self
                    .page
                    .attribute(el, "id")
                    .await?
                    .unwrap_or_default()
                    .to_lowercase();
                if label.contains(&form.time_label)
                    || placeholder.contains(&form.time_placeholder)
                    || id.contains(&form.time_placeholder)
                {
                    time_input = Some(el);
                    break;
                }
            }
        }

        let Some(input) = time_input else {
            tracing::warn!("inspection time input not found");
            return Ok(());
        };

        let formatted = autodvic_core::timefmt::portal_time(insp_time)?;
        self.page.set_value(input, &formatted).await?;
        tracing::debug!(time = %formatted, "filled inspection time");
        tokio::time::sleep(self.config.timing.ui_settle()).await;
        Ok(())
    }

    async fn answer_defects_question(&self, has_issues: bool) -> Result<()> {
        let issues = &self.config.issues;
        let mut group = Vec::new();

        for radio in self.page.query_all(&self.config.submission.radio_inputs).await? {
            let name = self.page.attribute(radio, "name").await?.unwrap_or_default();
            if name == issues.defects_radio_name {
                group.push(radio);
            }
        }

        if group.len() != 2 {
            tracing::error!(count = group.len(), "could not find defects radio buttons");
            let _ = self
                .page
                .show_notice(&Notice::warning(
                    "Defects selection",
                    "The defects yes/no controls were not found; please verify the answer manually.",
                ))
                .await;
            return Ok(());
        }

        let wanted = if has_issues { "true" } else { "false" };
        for radio in group {
            let value = self.page.attribute(radio, "value").await?.unwrap_or_default();
            if value == wanted {
                tracing::debug!(defects = has_issues, "answering defects question");
                self.page.click(radio).await?;
                tokio::time::sleep(self.config.timing.radio_settle()).await;
                break;
            }
        }
        Ok(())
    }

    async fn complete_defects_page(
        &self,
        submission: &InspectionSubmission,
    ) -> Result<FlowOutcome> {
        let timing = &self.config.timing;
        tokio::time::sleep(timing.page_load()).await;

        // Every category dropdown is collapsed on entry
        for dropdown in self.page.query_all(&self.config.issues.dropdown_expand).await? {
            if let Some(expand) = self.page.first_child(dropdown).await? {
                self.page.click(expand).await?;
                tokio::time::sleep(timing.dropdown_expand()).await;
            }
        }
        tokio::time::sleep(timing.dropdown_settle()).await;

        let mut unresolved = Vec::new();
        for issue in &submission.issues {
            let Some(mapping) = catalog::lookup(issue) else {
                // Catalog validation makes this unreachable for known IDs
                tracing::error!(issue = %issue, "no portal mapping for issue");
                continue;
            };

            if self.select_issue_checkbox(&mapping).await? {
                tracing::debug!(issue = %issue, "checked issue");
            } else {
                tracing::error!(
                    issue = %issue,
                    category = mapping.category.display_name(),
                    subcategory = mapping.subcategory,
                    "no matching checkbox found"
                );
                unresolved.push(UnresolvedIssue {
                    text: mapping.portal_text.to_string(),
                    category: mapping.category.display_name().to_string(),
                    subcategory: mapping.subcategory.to_string(),
                });
            }
        }

        if !unresolved.is_empty() {
            self.report_unresolved(&unresolved).await?;
            return Ok(FlowOutcome::ManualCompletion { unresolved });
        }

        let review = self
            .page
            .query(&format!(".{}", self.config.submission.next_button_class))
            .await?
            .ok_or_else(|| FlowError::missing("review button"))?;
        self.page.click(review).await?;
        tokio::time::sleep(timing.page_load()).await;

        self.final_submit().await
    }

    /// Nested category → subcategory → exact-text resolution for one issue.
    /// An already-checked or missing checkbox counts as unmatched: the flow
    /// must not guess about state it did not set.
    async fn select_issue_checkbox(&self, mapping: &IssueMapping) -> Result<bool> {
        let issues = &self.config.issues;

        for container in self.page.query_all(&issues.category_container).await? {
            let Some(&header) = self
                .page
                .query_within(container, &issues.category_header)
                .await?
                .first()
            else {
                continue;
            };
            if self.page.text(header).await?.trim() != mapping.category.display_name() {
                continue;
            }

            let mut subcategory_present = false;
            for sub in self.page.query_within(container, &issues.subcategory).await? {
                if self.page.text(sub).await?.trim() == mapping.subcategory {
                    subcategory_present = true;
                    break;
                }
            }
            if !subcategory_present {
                continue;
            }

            let Some(&issues_container) = self
                .page
                .query_within(container, &issues.issues_container)
                .await?
                .first()
            else {
                continue;
            };
            let Some(&fieldset) = self
                .page
                .query_within(issues_container, &issues.issues_fieldset)
                .await?
                .first()
            else {
                continue;
            };

            for element in self.page.query_within(fieldset, &issues.issue_element).await? {
                let Some(&label) = self
                    .page
                    .query_within(element, &issues.issue_label)
                    .await?
                    .first()
                else {
                    continue;
                };
                if self.page.text(label).await?.trim() != mapping.portal_text {
                    continue;
                }

                let checkbox = self
                    .page
                    .query_within(element, &issues.issue_checkbox)
                    .await?
                    .first()
                    .copied();
                match checkbox {
                    Some(cb) if !self.page.is_checked(cb).await? => {
                        self.page.click(cb).await?;
                        tokio::time::sleep(self.config.timing.radio_settle()).await;
                        return Ok(true);
                    }
                    _ => {
                        tracing::error!(
                            text = mapping.portal_text,
                            "checkbox not found or already checked"
                        );
                    }
                }
            }
        }
        Ok(false)
    }

    async fn report_unresolved(&self, unresolved: &[UnresolvedIssue]) -> Result<()> {
        let mut message = String::from(
            "Some issues could not be automatically selected. Please manually select these issues:\n\n",
        );
        for issue in unresolved {
            message.push_str(&format!(
                "\u{2022} {}\n   Category: {}\n   Subcategory: {}\n\n",
                issue.text, issue.category, issue.subcategory
            ));
        }
        message.push_str(
            "\nAfter selecting these issues, please click the \"Review and Submit\" button to continue.",
        );

        let _ = self.events.send(Message::ShowNotification {
            title: "Manual Selection Required".to_string(),
            message: message.clone(),
        });
        self.page
            .show_notice(&Notice::warning("Manual Selection Required", message))
            .await?;
        Ok(())
    }

    async fn final_submit(&self) -> Result<FlowOutcome> {
        let sub = &self.config.submission;
        let mut submit = None;

        for el in self.page.query_all("button").await? {
            let classes = self.page.attribute(el, "class").await?.unwrap_or_default();
            if !classes
                .split_whitespace()
                .any(|c| c == sub.next_button_class)
            {
                continue;
            }
            if self.page.text(el).await?.trim().to_lowercase() == sub.submit_inspection_text {
                submit = Some(el);
                break;
            }
        }

        let submit = submit.ok_or_else(|| FlowError::missing("submit inspection button"))?;

        if self.dev_mode {
            tracing::info!("dev mode enabled, skipping submission");
            self.page
                .show_notice(&Notice::info(
                    "Dev Mode",
                    "Form submission skipped (development mode enabled)",
                ))
                .await?;
            return Ok(FlowOutcome::SkippedDevMode);
        }

        tracing::info!("submitting inspection");
        self.page.click(submit).await?;
        Ok(FlowOutcome::Submitted)
    }
}
