//! Radio selection strategies.
//!
//! The portal's reactive framework does not respond uniformly to synthetic
//! interaction: a native click works on some controls, others only pick up
//! property mutation or event dispatch, and some only react through their
//! label. Selection is therefore an ordered chain of attempts, stopping at
//! the first one that leaves the radio checked.

use crate::error::Result;
use autodvic_portal::page::{ElementId, PortalPage};
use autodvic_portal::selectors::Timing;

/// One way of trying to select a radio input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioStrategy {
    /// Native click on the input
    NativeClick,
    /// Set the checked property and ARIA attribute directly
    SetProperties,
    /// Dispatch synthetic `change` and `input` events
    DispatchEvents,
    /// Click the associated `<label>`
    ClickLabel,
}

impl RadioStrategy {
    /// The fallback chain, in the order the attempts are made.
    pub const ORDER: [RadioStrategy; 4] = [
        Self::NativeClick,
        Self::SetProperties,
        Self::DispatchEvents,
        Self::ClickLabel,
    ];

    /// Make one attempt. Whether it worked is judged afterwards by
    /// re-reading the checked state, not by this call succeeding.
    pub async fn attempt(self, page: &dyn PortalPage, radio: ElementId) -> Result<()> {
        match self {
            Self::NativeClick => page.click(radio).await?,
            Self::SetProperties => page.set_checked(radio, true).await?,
            Self::DispatchEvents => {
                page.dispatch_event(radio, "change").await?;
                page.dispatch_event(radio, "input").await?;
            }
            Self::ClickLabel => {
                let label = match page.closest(radio, "label").await? {
                    Some(label) => Some(label),
                    None => match page.attribute(radio, "id").await? {
                        Some(id) if !id.is_empty() => {
                            page.query(&format!("label[for=\"{id}\"]")).await?
                        }
                        _ => None,
                    },
                };
                if let Some(label) = label {
                    page.click(label).await?;
                }
            }
        }
        Ok(())
    }
}

/// Run the strategy chain against `radio` until one attempt results in
/// `checked == true`. Returns the final checked state.
pub async fn select_radio(
    page: &dyn PortalPage,
    radio: ElementId,
    timing: &Timing,
) -> Result<bool> {
    for strategy in RadioStrategy::ORDER {
        strategy.attempt(page, radio).await?;
        tokio::time::sleep(timing.radio_settle()).await;

        if page.is_checked(radio).await? {
            tracing::debug!(?strategy, "radio selected");
            return Ok(true);
        }
        tracing::debug!(?strategy, "radio still unchecked after attempt");
    }
    Ok(page.is_checked(radio).await?)
}
