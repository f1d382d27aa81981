//! The DOM seam: an async trait over the live portal page.
//!
//! The flow engine only ever talks to this trait. The CDP implementation
//! drives a real browser; tests drive an in-memory page. Element handles
//! are opaque and may go stale across navigations — every flow step
//! re-queries rather than holding handles across transitions.

use crate::error::Result;
use crate::notice::Notice;
use async_trait::async_trait;

/// Opaque handle to one element on the page, issued by the backend.
pub type ElementId = u64;

/// Operations the automation performs against the portal page.
///
/// The portal DOM is an external, eventually-consistent resource: every
/// lookup returns "not there (yet)" as a normal outcome instead of
/// assuming presence.
#[async_trait]
pub trait PortalPage: Send + Sync {
    /// Current page URL.
    async fn current_url(&self) -> Result<String>;

    /// First element matching the selector, if any.
    async fn query(&self, selector: &str) -> Result<Option<ElementId>>;

    /// All elements matching the selector, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementId>>;

    /// All elements matching the selector within a root element.
    async fn query_within(&self, root: ElementId, selector: &str) -> Result<Vec<ElementId>>;

    /// Nearest ancestor (or self) matching the selector.
    async fn closest(&self, el: ElementId, selector: &str) -> Result<Option<ElementId>>;

    /// First child element, if any.
    async fn first_child(&self, el: ElementId) -> Result<Option<ElementId>>;

    /// Text content of the element's subtree.
    async fn text(&self, el: ElementId) -> Result<String>;

    /// Current value of an input element.
    async fn value(&self, el: ElementId) -> Result<String>;

    /// Set an input's value and dispatch a bubbling `input` event, the way
    /// the portal's reactive framework expects edits to arrive.
    async fn set_value(&self, el: ElementId, value: &str) -> Result<()>;

    /// Attribute value, if present.
    async fn attribute(&self, el: ElementId, name: &str) -> Result<Option<String>>;

    /// Set an attribute.
    async fn set_attribute(&self, el: ElementId, name: &str, value: &str) -> Result<()>;

    /// Checked state of a radio/checkbox.
    async fn is_checked(&self, el: ElementId) -> Result<bool>;

    /// Set the checked property and mirror it into `aria-checked`.
    async fn set_checked(&self, el: ElementId, checked: bool) -> Result<()>;

    /// Click the element.
    async fn click(&self, el: ElementId) -> Result<()>;

    /// Dispatch a bubbling event of the given type.
    async fn dispatch_event(&self, el: ElementId, event: &str) -> Result<()>;

    /// Focus the element.
    async fn focus(&self, el: ElementId) -> Result<()>;

    /// The element's tab index.
    async fn tab_index(&self, el: ElementId) -> Result<i64>;

    /// Dim the rest of the screen and point the operator at the element
    /// with a highlighted border and a floating message.
    async fn spotlight(&self, el: ElementId, message: &str) -> Result<()>;

    /// Remove the spotlight decoration. Safe to call when none is shown.
    async fn clear_spotlight(&self) -> Result<()>;

    /// Draw an attention border around the element.
    async fn highlight(&self, el: ElementId) -> Result<()>;

    /// Remove the attention border. Safe to call when none is shown.
    async fn clear_highlight(&self) -> Result<()>;

    /// Render a stacked on-page notice.
    async fn show_notice(&self, notice: &Notice) -> Result<()>;

    /// Insert the action control immediately before the given element.
    async fn inject_action_button(&self, before: ElementId) -> Result<()>;

    /// Remove the injected action control if present.
    async fn remove_action_button(&self) -> Result<()>;

    /// True if the action control has been clicked since the last call;
    /// clears the click marker.
    async fn take_action_click(&self) -> Result<bool>;
}

/// Find the first element matching `selector` whose trimmed text equals
/// `text` exactly.
pub async fn find_with_exact_text(
    page: &dyn PortalPage,
    selector: &str,
    text: &str,
) -> Result<Option<ElementId>> {
    for el in page.query_all(selector).await? {
        if page.text(el).await?.trim() == text {
            return Ok(Some(el));
        }
    }
    Ok(None)
}

/// Find the first `button` whose trimmed, lowercased text equals
/// `text_lower`.
pub async fn find_button_by_text(
    page: &dyn PortalPage,
    text_lower: &str,
) -> Result<Option<ElementId>> {
    for el in page.query_all("button").await? {
        if page.text(el).await?.trim().to_lowercase() == text_lower {
            return Ok(Some(el));
        }
    }
    Ok(None)
}

/// Find the first `button` carrying `class` whose lowercased text contains
/// any of the given needles.
pub async fn find_button_by_class_and_text(
    page: &dyn PortalPage,
    class: &str,
    needles_lower: &[&str],
) -> Result<Option<ElementId>> {
    for el in page.query_all("button").await? {
        let classes = page.attribute(el, "class").await?.unwrap_or_default();
        if !classes.split_whitespace().any(|c| c == class) {
            continue;
        }
        let text = page.text(el).await?.trim().to_lowercase();
        if needles_lower.iter().any(|needle| text.contains(needle)) {
            return Ok(Some(el));
        }
    }
    Ok(None)
}

/// Find the first text input whose `aria-label` contains `needle`
/// (case-insensitive).
pub async fn find_input_by_label(
    page: &dyn PortalPage,
    needle_lower: &str,
) -> Result<Option<ElementId>> {
    for el in page.query_all("input[type=\"text\"]").await? {
        let label = page
            .attribute(el, "aria-label")
            .await?
            .unwrap_or_default()
            .to_lowercase();
        if label.contains(needle_lower) {
            return Ok(Some(el));
        }
    }
    Ok(None)
}
