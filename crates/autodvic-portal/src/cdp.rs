//! Chrome DevTools Protocol implementation of [`PortalPage`].
//!
//! Element handles are issued locally and map to chromiumoxide `Element`s.
//! Handles go stale on navigation; callers re-query per step. DOM reads and
//! writes that CDP has no direct command for run as JS functions on the
//! element, with arguments embedded JSON-escaped.

use crate::error::{PortalError, Result};
use crate::notice::Notice;
use crate::page::{ElementId, PortalPage};
use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Attribute used to hand a JS-located node back to Rust.
const ADOPT_ATTR: &str = "data-autodvic-adopt";
/// Attribute scoping a sub-tree query to one root element.
const SCOPE_ATTR: &str = "data-autodvic-scope";
/// Attribute set by the injected control's click handler.
const CLICKED_ATTR: &str = "data-autodvic-clicked";
/// Marker class of the injected control.
const BUTTON_MARKER: &str = "auto-dvic-container";

/// A live portal tab driven over CDP.
pub struct CdpPage {
    page: Page,
    elements: Mutex<HashMap<ElementId, Element>>,
    next_id: AtomicU64,
}

impl CdpPage {
    /// Wrap a chromiumoxide page.
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self {
            page,
            elements: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    async fn register(&self, element: Element) -> ElementId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.elements.lock().await.insert(id, element);
        id
    }

    async fn find_all(&self, selector: &str) -> Vec<Element> {
        // A selector matching nothing is a normal outcome on this SPA, not
        // an error: the element may simply not be rendered yet.
        match self.page.find_elements(selector).await {
            Ok(elements) => elements,
            Err(e) => {
                tracing::debug!(selector, error = %e, "find_elements returned nothing");
                Vec::new()
            }
        }
    }

    async fn call_on(&self, el: ElementId, function: &str) -> Result<serde_json::Value> {
        let guard = self.elements.lock().await;
        let element = guard.get(&el).ok_or(PortalError::StaleElement(el))?;
        let ret = element
            .call_js_fn(function, false)
            .await
            .map_err(|e| PortalError::ChromiumError(e.to_string()))?;
        Ok(ret.result.value.unwrap_or(serde_json::Value::Null))
    }

    /// Run a JS function on `el` that tags its result node with
    /// [`ADOPT_ATTR`], then adopt that node as a new handle.
    async fn adopt_marked(&self, el: ElementId, function: &str) -> Result<Option<ElementId>> {
        let found = self.call_on(el, function).await?;
        if found != serde_json::Value::Bool(true) {
            return Ok(None);
        }

        let marked = self
            .page
            .find_element(format!("[{ADOPT_ATTR}]"))
            .await
            .map_err(|e| PortalError::ChromiumError(e.to_string()))?;
        marked
            .call_js_fn(
                format!("function() {{ this.removeAttribute('{ADOPT_ATTR}'); }}"),
                false,
            )
            .await
            .map_err(|e| PortalError::ChromiumError(e.to_string()))?;

        Ok(Some(self.register(marked).await))
    }

    async fn eval(&self, expr: String) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(expr)
            .await
            .map_err(|e| PortalError::ChromiumError(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    fn js_str(value: &str) -> String {
        serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
    }
}

#[async_trait]
impl PortalPage for CdpPage {
    async fn current_url(&self) -> Result<String> {
        self.page
            .url()
            .await
            .map_err(|e| PortalError::ChromiumError(e.to_string()))?
            .ok_or_else(|| PortalError::NavigationError("page has no URL".to_string()))
    }

    async fn query(&self, selector: &str) -> Result<Option<ElementId>> {
        let mut elements = self.find_all(selector).await;
        if elements.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.register(elements.remove(0)).await))
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementId>> {
        let mut ids = Vec::new();
        for element in self.find_all(selector).await {
            ids.push(self.register(element).await);
        }
        Ok(ids)
    }

    async fn query_within(&self, root: ElementId, selector: &str) -> Result<Vec<ElementId>> {
        let token = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.call_on(
            root,
            &format!("function() {{ this.setAttribute('{SCOPE_ATTR}', '{token}'); }}"),
        )
        .await?;

        let scoped = format!("[{SCOPE_ATTR}=\"{token}\"] {selector}");
        let mut ids = Vec::new();
        for element in self.find_all(&scoped).await {
            ids.push(self.register(element).await);
        }

        self.call_on(
            root,
            &format!("function() {{ this.removeAttribute('{SCOPE_ATTR}'); }}"),
        )
        .await?;
        Ok(ids)
    }

    async fn closest(&self, el: ElementId, selector: &str) -> Result<Option<ElementId>> {
        let function = format!(
            "function() {{ const m = this.closest({sel}); if (!m) return false; \
             m.setAttribute('{ADOPT_ATTR}', '1'); return true; }}",
            sel = Self::js_str(selector)
        );
        self.adopt_marked(el, &function).await
    }

    async fn first_child(&self, el: ElementId) -> Result<Option<ElementId>> {
        let function = format!(
            "function() {{ const c = this.firstElementChild; if (!c) return false; \
             c.setAttribute('{ADOPT_ATTR}', '1'); return true; }}"
        );
        self.adopt_marked(el, &function).await
    }

    async fn text(&self, el: ElementId) -> Result<String> {
        let guard = self.elements.lock().await;
        let element = guard.get(&el).ok_or(PortalError::StaleElement(el))?;
        let text = element
            .inner_text()
            .await
            .map_err(|e| PortalError::ChromiumError(e.to_string()))?;
        Ok(text.unwrap_or_default())
    }

    async fn value(&self, el: ElementId) -> Result<String> {
        let value = self
            .call_on(el, "function() { return this.value ?? ''; }")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn set_value(&self, el: ElementId, value: &str) -> Result<()> {
        let function = format!(
            "function() {{ this.value = {v}; \
             this.dispatchEvent(new Event('input', {{ bubbles: true }})); }}",
            v = Self::js_str(value)
        );
        self.call_on(el, &function).await?;
        Ok(())
    }

    async fn attribute(&self, el: ElementId, name: &str) -> Result<Option<String>> {
        let guard = self.elements.lock().await;
        let element = guard.get(&el).ok_or(PortalError::StaleElement(el))?;
        element
            .attribute(name)
            .await
            .map_err(|e| PortalError::ChromiumError(e.to_string()))
    }

    async fn set_attribute(&self, el: ElementId, name: &str, value: &str) -> Result<()> {
        let function = format!(
            "function() {{ this.setAttribute({n}, {v}); }}",
            n = Self::js_str(name),
            v = Self::js_str(value)
        );
        self.call_on(el, &function).await?;
        Ok(())
    }

    async fn is_checked(&self, el: ElementId) -> Result<bool> {
        let value = self
            .call_on(el, "function() { return !!this.checked; }")
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn set_checked(&self, el: ElementId, checked: bool) -> Result<()> {
        let function = format!(
            "function() {{ this.checked = {checked}; \
             this.setAttribute('aria-checked', '{checked}'); }}"
        );
        self.call_on(el, &function).await?;
        Ok(())
    }

    async fn click(&self, el: ElementId) -> Result<()> {
        let guard = self.elements.lock().await;
        let element = guard.get(&el).ok_or(PortalError::StaleElement(el))?;
        element
            .click()
            .await
            .map_err(|e| PortalError::ChromiumError(e.to_string()))?;
        Ok(())
    }

    async fn dispatch_event(&self, el: ElementId, event: &str) -> Result<()> {
        let function = format!(
            "function() {{ this.dispatchEvent(new Event({e}, {{ bubbles: true }})); }}",
            e = Self::js_str(event)
        );
        self.call_on(el, &function).await?;
        Ok(())
    }

    async fn focus(&self, el: ElementId) -> Result<()> {
        let guard = self.elements.lock().await;
        let element = guard.get(&el).ok_or(PortalError::StaleElement(el))?;
        element
            .focus()
            .await
            .map_err(|e| PortalError::ChromiumError(e.to_string()))?;
        Ok(())
    }

    async fn tab_index(&self, el: ElementId) -> Result<i64> {
        let value = self
            .call_on(el, "function() { return this.tabIndex; }")
            .await?;
        Ok(value.as_i64().unwrap_or(-1))
    }

    async fn spotlight(&self, el: ElementId, message: &str) -> Result<()> {
        // Four dimming quadrants around the element, a pulsing border, and
        // a floating instruction. Decoration only; pointer-events stay off
        // so it never blocks the flow.
        let function = format!(
            r#"function() {{
    const rect = this.getBoundingClientRect();
    const make = (css) => {{
        const d = document.createElement('div');
        d.className = 'autodvic-spotlight';
        d.style.cssText = 'position: fixed; background: rgba(0, 0, 0, 0.5); z-index: 9999; pointer-events: none;' + css;
        document.body.appendChild(d);
        return d;
    }};
    make(`top: 0; left: 0; right: 0; height: ${{rect.top - 10}}px;`);
    make(`top: ${{rect.bottom + 10}}px; left: 0; right: 0; bottom: 0;`);
    make(`top: ${{rect.top - 10}}px; left: 0; width: ${{rect.left - 10}}px; height: ${{rect.height + 20}}px;`);
    make(`top: ${{rect.top - 10}}px; left: ${{rect.right + 10}}px; right: 0; height: ${{rect.height + 20}}px;`);
    const border = make(`top: ${{rect.top - 5}}px; left: ${{rect.left - 5}}px; width: ${{rect.width + 10}}px; height: ${{rect.height + 10}}px;`);
    border.style.background = 'transparent';
    border.style.border = '2px solid #077398';
    border.style.borderRadius = '8px';
    border.style.zIndex = '9998';
    const msg = make(`top: ${{rect.bottom + 20}}px; left: 50%;`);
    msg.style.transform = 'translateX(-50%)';
    msg.style.background = '#077398';
    msg.style.color = 'white';
    msg.style.padding = '12px 24px';
    msg.style.borderRadius = '8px';
    msg.style.zIndex = '10000';
    msg.style.fontWeight = '500';
    msg.textContent = {message};
}}"#,
            message = Self::js_str(message)
        );
        self.call_on(el, &function).await?;
        Ok(())
    }

    async fn clear_spotlight(&self) -> Result<()> {
        self.eval(
            "document.querySelectorAll('.autodvic-spotlight').forEach(n => n.remove())"
                .to_string(),
        )
        .await?;
        Ok(())
    }

    async fn highlight(&self, el: ElementId) -> Result<()> {
        let function = r#"function() {
    const rect = this.getBoundingClientRect();
    const d = document.createElement('div');
    d.className = 'autodvic-input-highlight';
    d.style.cssText = `position: fixed; top: ${rect.top - 5}px; left: ${rect.left - 5}px;
        width: ${rect.width + 10}px; height: ${rect.height + 10}px;
        border: 2px solid #ff6b6b; border-radius: 4px;
        background: rgba(255, 107, 107, 0.1); z-index: 9999; pointer-events: none;`;
    document.body.appendChild(d);
}"#;
        self.call_on(el, function).await?;
        Ok(())
    }

    async fn clear_highlight(&self) -> Result<()> {
        self.eval(
            "document.querySelectorAll('.autodvic-input-highlight').forEach(n => n.remove())"
                .to_string(),
        )
        .await?;
        Ok(())
    }

    async fn show_notice(&self, notice: &Notice) -> Result<()> {
        let duration_ms = notice.level.display_duration().as_millis();
        let expr = format!(
            r#"(() => {{
    let stack = document.getElementById('autodvic-notices');
    if (!stack) {{
        stack = document.createElement('div');
        stack.id = 'autodvic-notices';
        stack.style.cssText = 'position: fixed; top: 20px; right: 20px; z-index: 10000; display: flex; flex-direction: column; gap: 8px;';
        document.body.appendChild(stack);
    }}
    const card = document.createElement('div');
    card.style.cssText = 'max-width: 400px; background: white; border: 2px solid #e47911; border-radius: 8px; padding: 16px; box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1);';
    const title = document.createElement('div');
    title.style.cssText = 'font-weight: bold; font-size: 16px; margin-bottom: 8px; color: #e47911;';
    title.textContent = {title};
    const body = document.createElement('div');
    body.style.cssText = 'white-space: pre-wrap; color: #333;';
    body.textContent = {message};
    const close = document.createElement('button');
    close.textContent = 'Close';
    close.style.cssText = 'background: #e47911; color: white; border: none; padding: 8px 16px; border-radius: 4px; cursor: pointer; float: right; margin-top: 8px;';
    close.onclick = () => card.remove();
    card.appendChild(title);
    card.appendChild(body);
    card.appendChild(close);
    stack.appendChild(card);
    setTimeout(() => card.remove(), {duration_ms});
}})()"#,
            title = Self::js_str(&notice.title),
            message = Self::js_str(&notice.message),
        );
        self.eval(expr).await?;
        Ok(())
    }

    async fn inject_action_button(&self, before: ElementId) -> Result<()> {
        let function = format!(
            r#"function() {{
    if (document.querySelector('.{BUTTON_MARKER}')) return false;
    const container = document.createElement('span');
    container.className = '{BUTTON_MARKER}';
    container.style.cssText = 'display: inline-flex; align-items: center; gap: 8px;';
    const button = document.createElement('button');
    button.textContent = 'Auto DVIC';
    button.style.cssText = 'background-color: #077398; color: white; border: none; border-radius: 8px; padding: 12px 22px; font-size: 15px; font-weight: 600; cursor: pointer; white-space: nowrap;';
    button.addEventListener('click', () => container.setAttribute('{CLICKED_ATTR}', '1'));
    container.appendChild(button);
    this.parentNode.insertBefore(container, this);
    return true;
}}"#
        );
        self.call_on(before, &function).await?;
        Ok(())
    }

    async fn remove_action_button(&self) -> Result<()> {
        self.eval(format!(
            "document.querySelectorAll('.{BUTTON_MARKER}').forEach(n => n.remove())"
        ))
        .await?;
        Ok(())
    }

    async fn take_action_click(&self) -> Result<bool> {
        let value = self
            .eval(format!(
                "(() => {{ const c = document.querySelector('[{CLICKED_ATTR}]'); \
                 if (!c) return false; c.removeAttribute('{CLICKED_ATTR}'); return true; }})()"
            ))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }
}
