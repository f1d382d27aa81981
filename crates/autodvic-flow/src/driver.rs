//! Driver autocomplete resolution.
//!
//! Typing a driver name into the portal's combobox populates a dependent
//! transporter-ID field once the right option is picked. The resolver
//! types the name, walks the options until the transporter ID verifies,
//! and otherwise highlights the input and waits for the operator to pick
//! the driver by hand - unblocked by observing the dependent field, not by
//! a timeout.

use crate::error::{FlowError, Result};
use autodvic_portal::page::{ElementId, PortalPage};
use autodvic_portal::selectors::{FormSelectors, Timing};
use autodvic_portal::wait::{wait_until, WaitOutcome};
use autodvic_portal::Notice;
use tokio_util::sync::CancellationToken;

/// How the driver ended up selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverResolution {
    /// An autocomplete option verified against the transporter ID
    Verified,
    /// The operator picked the driver manually after the prompt
    ManualConfirmed,
}

/// Select the driver whose transporter ID matches `transporter_id`.
///
/// # Errors
/// Returns [`FlowError::ElementMissing`] when the driver input is absent,
/// or [`FlowError::DriverSelectionCancelled`] when the manual wait is
/// cancelled before the operator confirms.
pub async fn resolve_driver(
    page: &dyn PortalPage,
    selectors: &FormSelectors,
    timing: &Timing,
    da_name: &str,
    transporter_id: &str,
    cancel: &CancellationToken,
) -> Result<DriverResolution> {
    let input = match page.query(&selectors.driver_input).await? {
        Some(el) => el,
        None => page
            .query(&selectors.driver_input_fallback)
            .await?
            .ok_or_else(|| FlowError::missing("driver name input"))?,
    };

    page.focus(input).await?;
    page.click(input).await?;
    page.set_value(input, da_name).await?;
    tracing::debug!(da_name, transporter_id, "typed driver name");

    for attempt in 0..timing.driver_max_attempts {
        tokio::time::sleep(timing.driver_dropdown()).await;
        if transporter_verified(page, selectors, transporter_id).await? {
            tracing::debug!(attempt, "transporter ID verified");
            return Ok(DriverResolution::Verified);
        }

        let options = open_driver_options(page, selectors, input, da_name, timing).await?;
        tracing::debug!(attempt, count = options.len(), "driver options");

        let Some(&option) = options.get(attempt as usize) else {
            break; // options exhausted
        };
        page.click(option).await?;
        tokio::time::sleep(timing.driver_dropdown()).await;

        if transporter_verified(page, selectors, transporter_id).await? {
            tracing::debug!(attempt, "option verified");
            return Ok(DriverResolution::Verified);
        }
    }

    prompt_manual_selection(page, selectors, timing, input, transporter_id, cancel).await
}

/// True when the transporter field shows exactly the expected ID. Empty
/// values on either side never verify.
async fn transporter_verified(
    page: &dyn PortalPage,
    selectors: &FormSelectors,
    expected: &str,
) -> Result<bool> {
    let Some(input) = page.query(&selectors.transporter_input).await? else {
        return Ok(false);
    };

    let current = page.value(input).await?;
    let (current, expected) = (current.trim(), expected.trim());
    if current.is_empty() || expected.is_empty() {
        return Ok(false);
    }
    Ok(current == expected)
}

/// Re-type the name, open the combobox, pin its ARIA state, and return the
/// visible options.
async fn open_driver_options(
    page: &dyn PortalPage,
    selectors: &FormSelectors,
    input: ElementId,
    da_name: &str,
    timing: &Timing,
) -> Result<Vec<ElementId>> {
    page.set_value(input, da_name).await?;
    tokio::time::sleep(timing.driver_dropdown()).await;

    let Some(container) = page.closest(input, &selectors.combobox_container).await? else {
        tracing::debug!("combobox container not found");
        return Ok(Vec::new());
    };

    page.click(container).await?;
    tokio::time::sleep(timing.driver_dropdown()).await;

    page.focus(input).await?;
    if page.value(input).await? != da_name {
        page.set_value(input, da_name).await?;
    }
    tokio::time::sleep(timing.driver_dropdown()).await;

    if let Some(combo) = page
        .query_within(container, &selectors.combobox_input)
        .await?
        .first()
        .copied()
    {
        page.set_attribute(combo, "aria-expanded", "true").await?;
        page.set_attribute(combo, "aria-haspopup", "true").await?;
    }

    Ok(page.query_all(&selectors.combobox_option).await?)
}

/// Highlight the input, tell the operator to pick the driver, and resolve
/// the moment the transporter field verifies - however that happens.
async fn prompt_manual_selection(
    page: &dyn PortalPage,
    selectors: &FormSelectors,
    timing: &Timing,
    input: ElementId,
    transporter_id: &str,
    cancel: &CancellationToken,
) -> Result<DriverResolution> {
    tracing::warn!("autocomplete never verified, prompting for manual driver selection");

    page.highlight(input).await?;
    page.show_notice(&Notice::warning(
        "Driver Selection Required",
        "Please select the correct driver manually.",
    ))
    .await?;

    let outcome = wait_until(
        move || async move { transporter_verified(page, selectors, transporter_id).await },
        timing.driver_dropdown(),
        None,
        cancel,
    )
    .await?;

    page.clear_highlight().await?;

    match outcome {
        WaitOutcome::Satisfied => {
            tracing::info!("correct driver selected by operator");
            Ok(DriverResolution::ManualConfirmed)
        }
        WaitOutcome::TimedOut | WaitOutcome::Cancelled => {
            Err(FlowError::DriverSelectionCancelled)
        }
    }
}
