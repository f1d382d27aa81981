//! Action-button injection and page watching.
//!
//! Keeps the custom action control present exactly once on qualifying
//! pages (a vehicle detail view with the inspections tab active) and
//! removed everywhere else. The portal is a SPA, so qualification is
//! re-evaluated on a poll: URL changes, tab switches, and late renders all
//! surface as state differences between ticks.

use crate::error::Result;
use crate::vehicle::extract_vehicle_info;
use autodvic_core::{Message, StateStore};
use autodvic_portal::page::{ElementId, PortalPage};
use autodvic_portal::selectors::SelectorConfig;
use autodvic_portal::Notice;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use url::Url;

static VEHICLE_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/fleet-management/vehicles/[^/]+").expect("valid regex"));

/// True when the URL names a vehicle detail view, under any of the three
/// routing shapes the portal has used: a path segment, a hash fragment, or
/// a query parameter.
#[must_use]
pub fn is_vehicle_detail_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let path = parsed.path();

    if VEHICLE_PATH_RE.is_match(path) {
        return true;
    }
    if path == "/fleet-management" {
        if parsed.fragment().is_some_and(|f| f.contains("vehicles/")) {
            return true;
        }
        if parsed.query_pairs().any(|(key, _)| key == "vehicleId") {
            return true;
        }
    }
    false
}

/// State of the injection coordinator. Replaces free-floating
/// "injection in progress" flags: one owner, explicit transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionState {
    /// Not on a qualifying page, or retries exhausted
    Idle,
    /// A bounded retry chain is running
    Injecting {
        /// Zero-based attempt number
        attempt: u32,
    },
    /// The control is on the page
    Present,
}

/// Keeps the action control injected on qualifying pages.
pub struct ButtonInjector<'a> {
    config: &'a SelectorConfig,
    state: InjectionState,
    last_url: String,
}

impl<'a> ButtonInjector<'a> {
    pub fn new(config: &'a SelectorConfig) -> Self {
        Self {
            config,
            state: InjectionState::Idle,
            last_url: String::new(),
        }
    }

    /// Current coordinator state.
    #[must_use]
    pub fn state(&self) -> InjectionState {
        self.state
    }

    /// Page qualification: vehicle detail URL AND the inspections tab
    /// radio is the currently focused tab (tab index zero).
    pub async fn page_qualifies(&self, page: &dyn PortalPage) -> Result<bool> {
        let url = page.current_url().await?;
        if !is_vehicle_detail_url(&url) {
            return Ok(false);
        }

        let nav = &self.config.navigation;
        for input in page.query_all(&nav.tab_radio_inputs).await? {
            let value = page.attribute(input, "value").await?.unwrap_or_default();
            if value == nav.inspections_tab_value && page.tab_index(input).await? == 0 {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn control_present(&self, page: &dyn PortalPage) -> Result<bool> {
        Ok(page
            .query(&self.config.navigation.action_button_marker)
            .await?
            .is_some())
    }

    /// The portal's native upload button: by configured class first, then
    /// a scan of all buttons for one whose span carries the literal text.
    async fn find_upload_button(&self, page: &dyn PortalPage) -> Result<Option<ElementId>> {
        let nav = &self.config.navigation;

        for el in page.query_all(&nav.upload_button_class).await? {
            if page.text(el).await?.trim() == nav.upload_button_text {
                return Ok(Some(el));
            }
        }

        for button in page.query_all("button").await? {
            for span in page.query_within(button, "span").await? {
                if page.text(span).await?.trim() == nav.upload_button_text {
                    return Ok(Some(button));
                }
            }
        }
        Ok(None)
    }

    async fn try_inject(&self, page: &dyn PortalPage) -> Result<bool> {
        let Some(upload) = self.find_upload_button(page).await? else {
            return Ok(false);
        };
        page.inject_action_button(upload).await?;
        tracing::info!("action button injected");
        Ok(true)
    }

    /// Ensure the control is present exactly once on a qualifying page and
    /// absent otherwise. Tab-switching away is the one teardown path.
    pub async fn ensure(&mut self, page: &dyn PortalPage) -> Result<()> {
        if matches!(self.state, InjectionState::Injecting { .. }) {
            // A retry chain is already running; never start a second one
            return Ok(());
        }

        if !self.page_qualifies(page).await? {
            if self.control_present(page).await? {
                tracing::debug!("page no longer qualifies, removing action button");
                page.remove_action_button().await?;
            }
            self.state = InjectionState::Idle;
            return Ok(());
        }

        if self.control_present(page).await? {
            self.state = InjectionState::Present;
            return Ok(());
        }

        let timing = &self.config.timing;
        for attempt in 0..timing.inject_max_attempts {
            self.state = InjectionState::Injecting { attempt };
            if self.try_inject(page).await? {
                self.state = InjectionState::Present;
                tracing::debug!(attempt, "button injection successful");
                return Ok(());
            }
            let delay = timing.inject_retry_delay(attempt);
            tracing::debug!(attempt, ?delay, "injection attempt failed, retrying");
            tokio::time::sleep(delay).await;
        }

        tracing::debug!("max injection attempts reached, resetting injection state");
        self.state = InjectionState::Idle;
        Ok(())
    }

    /// Detect a SPA navigation by comparing URLs; on change, reset the
    /// state machine and re-run injection. Returns whether a change was
    /// seen.
    pub async fn handle_url_change(&mut self, page: &dyn PortalPage) -> Result<bool> {
        let current = page.current_url().await?;
        if current == self.last_url {
            return Ok(false);
        }
        tracing::debug!(url = %current, "URL changed");
        self.last_url = current;
        self.state = InjectionState::Idle;
        self.ensure(page).await?;
        Ok(true)
    }

    /// Watch loop: polls at the check interval for navigations and tab
    /// switches, keeps the control in the right state, and services clicks
    /// on it by extracting vehicle info. Runs until cancelled.
    pub async fn watch(
        &mut self,
        page: &dyn PortalPage,
        store: &StateStore,
        events: &UnboundedSender<Message>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.last_url = page.current_url().await?;
        self.ensure(page).await?;

        loop {
            tokio::select! {
                () = cancel.cancelled() => return Ok(()),
                () = tokio::time::sleep(self.config.timing.check_interval()) => {}
            }

            if !self.handle_url_change(page).await? {
                // Same URL: tab switches and late renders still change
                // qualification, so re-evaluate anyway
                self.ensure(page).await?;
            }

            if page.take_action_click().await? {
                self.service_action_click(page, store, events).await?;
            }
        }
    }

    async fn service_action_click(
        &self,
        page: &dyn PortalPage,
        store: &StateStore,
        events: &UnboundedSender<Message>,
    ) -> Result<()> {
        tracing::info!("action button clicked, gathering vehicle info");
        match extract_vehicle_info(page, &self.config.vehicle).await {
            Ok(info) => {
                if let Err(err) = store.record_vehicle_info(&info) {
                    tracing::error!(error = %err, "failed to persist vehicle info");
                }
                let _ = events.send(Message::VehicleInfoUpdated { data: info });
                let _ = events.send(Message::OpenPopupFromPage);
            }
            Err(err) => {
                tracing::error!(error = %err, "vehicle info gathering failed");
                let _ = page
                    .show_notice(&Notice::error(
                        "Vehicle info",
                        "Failed to gather vehicle information - the page layout may have changed.",
                    ))
                    .await;
            }
        }
        Ok(())
    }
}
