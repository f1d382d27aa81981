//! Browser session management.
//!
//! Launches a Chromium instance or attaches to an already-running browser
//! through its DevTools websocket, then locates (or opens) the portal tab.
//! Attaching is the common path: the portal requires the operator's login
//! session, which lives in their own browser profile.

use crate::cdp::CdpPage;
use crate::error::{PortalError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures_util::stream::StreamExt;

/// A running browser hosting the portal.
pub struct PortalBrowser {
    browser: Browser,
}

impl PortalBrowser {
    /// Launch a new Chromium instance.
    pub async fn launch(headless: bool) -> Result<Self> {
        let mut builder = BrowserConfig::builder().no_sandbox();
        if !headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(PortalError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| PortalError::ChromiumError(e.to_string()))?;

        // Drive the CDP event loop for the life of the browser
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        tracing::info!(headless, "launched browser");
        Ok(Self { browser })
    }

    /// Attach to an already-running browser via its DevTools websocket URL.
    pub async fn connect(ws_url: &str) -> Result<Self> {
        let (browser, mut handler) = Browser::connect(ws_url)
            .await
            .map_err(|e| PortalError::ChromiumError(e.to_string()))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        tracing::info!(ws_url, "attached to running browser");
        Ok(Self { browser })
    }

    /// Find the open tab showing the portal, or open a new one at
    /// `base_url` when none exists.
    pub async fn portal_page(&self, base_url: &str) -> Result<CdpPage> {
        let pages = self
            .browser
            .pages()
            .await
            .map_err(|e| PortalError::ChromiumError(e.to_string()))?;

        for page in pages {
            if let Ok(Some(url)) = page.url().await {
                if url.starts_with(base_url) {
                    tracing::debug!(url, "reusing existing portal tab");
                    return Ok(CdpPage::new(page));
                }
            }
        }

        tracing::debug!(base_url, "no portal tab found, opening one");
        let page = self
            .browser
            .new_page(base_url)
            .await
            .map_err(|e| PortalError::NavigationError(e.to_string()))?;
        Ok(CdpPage::new(page))
    }
}
