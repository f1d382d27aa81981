//! In-memory `PortalPage` used by the crate's tests.
//!
//! Models just enough of a DOM to exercise the flow: an element tree with
//! classes/attributes/values, a CSS-subset matcher covering the selector
//! shapes in the registry (tag, `.class`, `#id`, `[attr]`, `[attr="v"]`,
//! `[attr*="v"]`, descendant and child combinators), default radio and
//! checkbox click behavior, and per-node click hooks for portal side
//! effects (autocomplete options filling the transporter field, stubborn
//! radios that ignore clicks).

use autodvic_portal::error::{PortalError, Result};
use autodvic_portal::notice::Notice;
use autodvic_portal::page::{ElementId, PortalPage};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

type ClickHook = Box<dyn FnMut(&mut FakeDom) + Send>;

#[derive(Default)]
pub struct FakeNode {
    pub tag: String,
    pub classes: Vec<String>,
    pub attrs: HashMap<String, String>,
    pub text: String,
    pub value: String,
    pub checked: bool,
    pub tab_index: i64,
    pub detached: bool,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

#[derive(Default)]
pub struct FakeDom {
    pub nodes: Vec<FakeNode>,
    pub url: String,
    pub notices: Vec<Notice>,
    pub spotlight_active: bool,
    pub spotlight_messages: Vec<String>,
    pub highlight_active: bool,
    pub action_clicked: bool,
    pub click_log: Vec<usize>,
    click_inert: HashSet<usize>,
    set_checked_inert: HashSet<usize>,
    click_hooks: HashMap<usize, ClickHook>,
}

/// Shareable fake page; clones point at the same DOM.
#[derive(Clone)]
pub struct FakePage {
    dom: Arc<Mutex<FakeDom>>,
}

impl FakePage {
    pub fn new(url: &str) -> Self {
        let mut dom = FakeDom {
            url: url.to_string(),
            ..FakeDom::default()
        };
        dom.nodes.push(FakeNode {
            tag: "body".to_string(),
            ..FakeNode::default()
        });
        Self {
            dom: Arc::new(Mutex::new(dom)),
        }
    }

    /// Clone sharing the same DOM, for concurrent test actors.
    pub fn shared(&self) -> FakePage {
        self.clone()
    }

    pub fn add_node(&self, parent: usize, tag: &str, classes: &[&str], text: &str) -> usize {
        let mut dom = self.dom.lock().expect("lock dom");
        let idx = dom.nodes.len();
        dom.nodes.push(FakeNode {
            tag: tag.to_string(),
            classes: classes.iter().map(ToString::to_string).collect(),
            text: text.to_string(),
            tab_index: -1,
            parent: Some(parent),
            ..FakeNode::default()
        });
        dom.nodes[parent].children.push(idx);
        idx
    }

    pub fn set_attr(&self, idx: usize, name: &str, value: &str) {
        let mut dom = self.dom.lock().expect("lock dom");
        dom.nodes[idx].attrs.insert(name.to_string(), value.to_string());
    }

    pub fn attr(&self, idx: usize, name: &str) -> Option<String> {
        let dom = self.dom.lock().expect("lock dom");
        dom.nodes[idx].attrs.get(name).cloned()
    }

    pub fn set_node_value(&self, idx: usize, value: &str) {
        let mut dom = self.dom.lock().expect("lock dom");
        dom.nodes[idx].value = value.to_string();
    }

    pub fn set_node_checked(&self, idx: usize, checked: bool) {
        let mut dom = self.dom.lock().expect("lock dom");
        dom.nodes[idx].checked = checked;
    }

    pub fn node_checked(&self, idx: usize) -> bool {
        let dom = self.dom.lock().expect("lock dom");
        dom.nodes[idx].checked
    }

    pub fn set_tab_index(&self, idx: usize, tab_index: i64) {
        let mut dom = self.dom.lock().expect("lock dom");
        dom.nodes[idx].tab_index = tab_index;
    }

    pub fn set_url(&self, url: &str) {
        let mut dom = self.dom.lock().expect("lock dom");
        dom.url = url.to_string();
    }

    /// Make native clicks on this node do nothing, as the portal's
    /// framework sometimes does with synthetic clicks.
    pub fn make_click_inert(&self, idx: usize) {
        let mut dom = self.dom.lock().expect("lock dom");
        dom.click_inert.insert(idx);
    }

    /// Make property mutation on this node do nothing either.
    pub fn make_set_checked_inert(&self, idx: usize) {
        let mut dom = self.dom.lock().expect("lock dom");
        dom.set_checked_inert.insert(idx);
    }

    /// Clicking `idx` checks `radio` (label-for wiring).
    pub fn on_click_check(&self, idx: usize, radio: usize) {
        self.on_click(idx, move |dom| {
            dom.nodes[radio].checked = true;
            dom.nodes[radio]
                .attrs
                .insert("aria-checked".to_string(), "true".to_string());
        });
    }

    /// Clicking `idx` writes `value` into `target`'s value (autocomplete
    /// option side effect).
    pub fn on_click_set_value(&self, idx: usize, target: usize, value: &str) {
        let value = value.to_string();
        self.on_click(idx, move |dom| {
            dom.nodes[target].value.clone_from(&value);
        });
    }

    pub fn on_click(&self, idx: usize, hook: impl FnMut(&mut FakeDom) + Send + 'static) {
        let mut dom = self.dom.lock().expect("lock dom");
        dom.click_hooks.insert(idx, Box::new(hook));
    }

    pub fn click_count(&self, idx: usize) -> usize {
        let dom = self.dom.lock().expect("lock dom");
        dom.click_log.iter().filter(|&&i| i == idx).count()
    }

    pub fn was_clicked(&self, idx: usize) -> bool {
        self.click_count(idx) > 0
    }

    pub fn notice_titles(&self) -> Vec<String> {
        let dom = self.dom.lock().expect("lock dom");
        dom.notices.iter().map(|n| n.title.clone()).collect()
    }

    pub fn spotlight_active(&self) -> bool {
        self.dom.lock().expect("lock dom").spotlight_active
    }

    pub fn highlight_active(&self) -> bool {
        self.dom.lock().expect("lock dom").highlight_active
    }

    pub fn action_button_present(&self) -> bool {
        let dom = self.dom.lock().expect("lock dom");
        dom.nodes
            .iter()
            .any(|n| !n.detached && n.classes.iter().any(|c| c == "auto-dvic-container"))
    }

    /// Simulate the operator clicking the injected control.
    pub fn press_action_button(&self) {
        let mut dom = self.dom.lock().expect("lock dom");
        dom.action_clicked = true;
    }

    fn node(dom: &FakeDom, el: ElementId) -> std::result::Result<usize, PortalError> {
        let idx = usize::try_from(el).map_err(|_| PortalError::StaleElement(el))?;
        match dom.nodes.get(idx) {
            Some(node) if !node.detached => Ok(idx),
            _ => Err(PortalError::StaleElement(el)),
        }
    }

    fn document_order(dom: &FakeDom) -> Vec<usize> {
        let mut order = Vec::new();
        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            let node = &dom.nodes[idx];
            if node.detached {
                continue;
            }
            order.push(idx);
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        order
    }

    fn select(dom: &FakeDom, selector: &str) -> Vec<usize> {
        let (parts, combs) = parse_selector(selector);
        Self::document_order(dom)
            .into_iter()
            .filter(|&idx| idx != 0 && matches_chain(dom, idx, &parts, &combs, parts.len() - 1))
            .collect()
    }

    fn select_within(dom: &FakeDom, root: usize, selector: &str) -> Vec<usize> {
        Self::select(dom, selector)
            .into_iter()
            .filter(|&idx| is_descendant(dom, idx, root))
            .collect()
    }
}

fn is_descendant(dom: &FakeDom, mut idx: usize, root: usize) -> bool {
    while let Some(parent) = dom.nodes[idx].parent {
        if parent == root {
            return true;
        }
        idx = parent;
    }
    false
}

#[derive(Debug, Default, Clone)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

#[derive(Debug, Clone)]
enum AttrTest {
    Present(String),
    Eq(String, String),
    Contains(String, String),
}

#[derive(Debug, Clone, Copy)]
enum Comb {
    Descendant,
    Child,
}

fn parse_selector(selector: &str) -> (Vec<Compound>, Vec<Comb>) {
    // Tokenize without splitting inside attribute brackets: values like
    // [placeholder="Transporter ID"] contain spaces.
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in selector.chars() {
        match c {
            '[' => {
                depth += 1;
                current.push(c);
            }
            ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            '>' if depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
                tokens.push(">".to_string());
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        tokens.push(current.trim().to_string());
    }

    let mut parts = Vec::new();
    let mut combs = Vec::new();
    let mut pending = Comb::Descendant;

    for token in tokens {
        if token == ">" {
            pending = Comb::Child;
            continue;
        }
        if !parts.is_empty() {
            combs.push(pending);
        }
        parts.push(parse_compound(&token));
        pending = Comb::Descendant;
    }
    (parts, combs)
}

fn parse_compound(token: &str) -> Compound {
    let mut compound = Compound::default();
    let chars: Vec<char> = token.chars().collect();
    let mut i = 0;

    let ident = |chars: &[char], start: usize| -> (String, usize) {
        let mut end = start;
        while end < chars.len()
            && (chars[end].is_alphanumeric() || chars[end] == '-' || chars[end] == '_')
        {
            end += 1;
        }
        (chars[start..end].iter().collect(), end)
    };

    if i < chars.len() && chars[i] != '.' && chars[i] != '#' && chars[i] != '[' {
        let (tag, next) = ident(&chars, i);
        compound.tag = Some(tag);
        i = next;
    }

    while i < chars.len() {
        match chars[i] {
            '.' => {
                let (class, next) = ident(&chars, i + 1);
                compound.classes.push(class);
                i = next;
            }
            '#' => {
                let (id, next) = ident(&chars, i + 1);
                compound.id = Some(id);
                i = next;
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|&c| c == ']')
                    .map_or(chars.len(), |p| i + p);
                let inner: String = chars[i + 1..close].iter().collect();
                compound.attrs.push(parse_attr_test(&inner));
                i = close + 1;
            }
            _ => break,
        }
    }
    compound
}

fn parse_attr_test(inner: &str) -> AttrTest {
    let unquote = |s: &str| s.trim_matches(|c| c == '"' || c == '\'').to_string();
    if let Some((name, value)) = inner.split_once("*=") {
        AttrTest::Contains(name.trim().to_string(), unquote(value.trim()))
    } else if let Some((name, value)) = inner.split_once('=') {
        AttrTest::Eq(name.trim().to_string(), unquote(value.trim()))
    } else {
        AttrTest::Present(inner.trim().to_string())
    }
}

fn compound_matches(dom: &FakeDom, idx: usize, compound: &Compound) -> bool {
    let node = &dom.nodes[idx];

    if let Some(tag) = &compound.tag {
        if &node.tag != tag {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if node.attrs.get("id") != Some(id) {
            return false;
        }
    }
    for class in &compound.classes {
        if !node.classes.contains(class) {
            return false;
        }
    }
    for test in &compound.attrs {
        let read = |name: &str| -> Option<String> {
            if name == "class" {
                Some(node.classes.join(" "))
            } else {
                node.attrs.get(name).cloned()
            }
        };
        let ok = match test {
            AttrTest::Present(name) => read(name).is_some(),
            AttrTest::Eq(name, value) => read(name).as_deref() == Some(value),
            AttrTest::Contains(name, value) => {
                read(name).is_some_and(|v| v.contains(value.as_str()))
            }
        };
        if !ok {
            return false;
        }
    }
    true
}

fn matches_chain(dom: &FakeDom, idx: usize, parts: &[Compound], combs: &[Comb], k: usize) -> bool {
    if !compound_matches(dom, idx, &parts[k]) {
        return false;
    }
    if k == 0 {
        return true;
    }
    match combs[k - 1] {
        Comb::Child => dom.nodes[idx]
            .parent
            .is_some_and(|p| matches_chain(dom, p, parts, combs, k - 1)),
        Comb::Descendant => {
            let mut cur = dom.nodes[idx].parent;
            while let Some(p) = cur {
                if matches_chain(dom, p, parts, combs, k - 1) {
                    return true;
                }
                cur = dom.nodes[p].parent;
            }
            false
        }
    }
}

fn subtree_text(dom: &FakeDom, idx: usize, out: &mut String) {
    let node = &dom.nodes[idx];
    if node.detached {
        return;
    }
    out.push_str(&node.text);
    for &child in &node.children {
        subtree_text(dom, child, out);
    }
}

#[async_trait]
impl PortalPage for FakePage {
    async fn current_url(&self) -> Result<String> {
        Ok(self.dom.lock().expect("lock dom").url.clone())
    }

    async fn query(&self, selector: &str) -> Result<Option<ElementId>> {
        let dom = self.dom.lock().expect("lock dom");
        Ok(Self::select(&dom, selector).first().map(|&i| i as ElementId))
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementId>> {
        let dom = self.dom.lock().expect("lock dom");
        Ok(Self::select(&dom, selector)
            .into_iter()
            .map(|i| i as ElementId)
            .collect())
    }

    async fn query_within(&self, root: ElementId, selector: &str) -> Result<Vec<ElementId>> {
        let dom = self.dom.lock().expect("lock dom");
        let root = Self::node(&dom, root)?;
        Ok(Self::select_within(&dom, root, selector)
            .into_iter()
            .map(|i| i as ElementId)
            .collect())
    }

    async fn closest(&self, el: ElementId, selector: &str) -> Result<Option<ElementId>> {
        let dom = self.dom.lock().expect("lock dom");
        let (parts, combs) = parse_selector(selector);
        let mut cur = Some(Self::node(&dom, el)?);
        while let Some(idx) = cur {
            if idx != 0 && matches_chain(&dom, idx, &parts, &combs, parts.len() - 1) {
                return Ok(Some(idx as ElementId));
            }
            cur = dom.nodes[idx].parent;
        }
        Ok(None)
    }

    async fn first_child(&self, el: ElementId) -> Result<Option<ElementId>> {
        let dom = self.dom.lock().expect("lock dom");
        let idx = Self::node(&dom, el)?;
        Ok(dom.nodes[idx]
            .children
            .iter()
            .find(|&&c| !dom.nodes[c].detached)
            .map(|&c| c as ElementId))
    }

    async fn text(&self, el: ElementId) -> Result<String> {
        let dom = self.dom.lock().expect("lock dom");
        let idx = Self::node(&dom, el)?;
        let mut out = String::new();
        subtree_text(&dom, idx, &mut out);
        Ok(out)
    }

    async fn value(&self, el: ElementId) -> Result<String> {
        let dom = self.dom.lock().expect("lock dom");
        let idx = Self::node(&dom, el)?;
        Ok(dom.nodes[idx].value.clone())
    }

    async fn set_value(&self, el: ElementId, value: &str) -> Result<()> {
        let mut dom = self.dom.lock().expect("lock dom");
        let idx = Self::node(&dom, el)?;
        dom.nodes[idx].value = value.to_string();
        Ok(())
    }

    async fn attribute(&self, el: ElementId, name: &str) -> Result<Option<String>> {
        let dom = self.dom.lock().expect("lock dom");
        let idx = Self::node(&dom, el)?;
        if name == "class" {
            return Ok(Some(dom.nodes[idx].classes.join(" ")));
        }
        Ok(dom.nodes[idx].attrs.get(name).cloned())
    }

    async fn set_attribute(&self, el: ElementId, name: &str, value: &str) -> Result<()> {
        let mut dom = self.dom.lock().expect("lock dom");
        let idx = Self::node(&dom, el)?;
        dom.nodes[idx]
            .attrs
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn is_checked(&self, el: ElementId) -> Result<bool> {
        let dom = self.dom.lock().expect("lock dom");
        let idx = Self::node(&dom, el)?;
        Ok(dom.nodes[idx].checked)
    }

    async fn set_checked(&self, el: ElementId, checked: bool) -> Result<()> {
        let mut dom = self.dom.lock().expect("lock dom");
        let idx = Self::node(&dom, el)?;
        if dom.set_checked_inert.contains(&idx) {
            return Ok(());
        }
        dom.nodes[idx].checked = checked;
        dom.nodes[idx]
            .attrs
            .insert("aria-checked".to_string(), checked.to_string());
        Ok(())
    }

    async fn click(&self, el: ElementId) -> Result<()> {
        let mut dom = self.dom.lock().expect("lock dom");
        let idx = Self::node(&dom, el)?;
        dom.click_log.push(idx);

        if let Some(mut hook) = dom.click_hooks.remove(&idx) {
            hook(&mut dom);
            dom.click_hooks.insert(idx, hook);
            return Ok(());
        }

        if dom.click_inert.contains(&idx) {
            return Ok(());
        }

        let node_type = dom.nodes[idx].attrs.get("type").cloned();
        match node_type.as_deref() {
            Some("radio") => {
                let name = dom.nodes[idx].attrs.get("name").cloned();
                dom.nodes[idx].checked = true;
                if let Some(name) = name {
                    for (other, node) in dom.nodes.iter_mut().enumerate() {
                        if other != idx && node.attrs.get("name") == Some(&name) {
                            node.checked = false;
                        }
                    }
                }
            }
            Some("checkbox") => {
                dom.nodes[idx].checked = !dom.nodes[idx].checked;
            }
            _ => {}
        }
        Ok(())
    }

    async fn dispatch_event(&self, el: ElementId, _event: &str) -> Result<()> {
        let dom = self.dom.lock().expect("lock dom");
        Self::node(&dom, el)?;
        Ok(())
    }

    async fn focus(&self, el: ElementId) -> Result<()> {
        let dom = self.dom.lock().expect("lock dom");
        Self::node(&dom, el)?;
        Ok(())
    }

    async fn tab_index(&self, el: ElementId) -> Result<i64> {
        let dom = self.dom.lock().expect("lock dom");
        let idx = Self::node(&dom, el)?;
        Ok(dom.nodes[idx].tab_index)
    }

    async fn spotlight(&self, el: ElementId, message: &str) -> Result<()> {
        let mut dom = self.dom.lock().expect("lock dom");
        Self::node(&dom, el)?;
        dom.spotlight_active = true;
        dom.spotlight_messages.push(message.to_string());
        Ok(())
    }

    async fn clear_spotlight(&self) -> Result<()> {
        self.dom.lock().expect("lock dom").spotlight_active = false;
        Ok(())
    }

    async fn highlight(&self, el: ElementId) -> Result<()> {
        let mut dom = self.dom.lock().expect("lock dom");
        Self::node(&dom, el)?;
        dom.highlight_active = true;
        Ok(())
    }

    async fn clear_highlight(&self) -> Result<()> {
        self.dom.lock().expect("lock dom").highlight_active = false;
        Ok(())
    }

    async fn show_notice(&self, notice: &Notice) -> Result<()> {
        self.dom.lock().expect("lock dom").notices.push(notice.clone());
        Ok(())
    }

    async fn inject_action_button(&self, before: ElementId) -> Result<()> {
        let mut dom = self.dom.lock().expect("lock dom");
        let before = Self::node(&dom, before)?;
        let Some(parent) = dom.nodes[before].parent else {
            return Err(PortalError::StaleElement(before as ElementId));
        };

        let idx = dom.nodes.len();
        dom.nodes.push(FakeNode {
            tag: "span".to_string(),
            classes: vec!["auto-dvic-container".to_string()],
            tab_index: -1,
            parent: Some(parent),
            ..FakeNode::default()
        });
        let position = dom.nodes[parent]
            .children
            .iter()
            .position(|&c| c == before)
            .unwrap_or(dom.nodes[parent].children.len());
        dom.nodes[parent].children.insert(position, idx);
        Ok(())
    }

    async fn remove_action_button(&self) -> Result<()> {
        let mut dom = self.dom.lock().expect("lock dom");
        for node in &mut dom.nodes {
            if node.classes.iter().any(|c| c == "auto-dvic-container") {
                node.detached = true;
            }
        }
        Ok(())
    }

    async fn take_action_click(&self) -> Result<bool> {
        let mut dom = self.dom.lock().expect("lock dom");
        let clicked = dom.action_clicked;
        dom.action_clicked = false;
        Ok(clicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_class_and_attr_selectors() {
        let page = FakePage::new("https://example.com/");
        let container = page.add_node(0, "div", &["css-qodthi"], "");
        let pill = page.add_node(container, "span", &["vehicle-pill-item"], "ABC1234 (WA)");

        assert_eq!(page.query(".css-qodthi").await.unwrap(), Some(container as u64));
        assert_eq!(
            page.query_all("[class*=\"pill-item\"]").await.unwrap(),
            vec![pill as u64]
        );
    }

    #[tokio::test]
    async fn test_child_combinator() {
        let page = FakePage::new("https://example.com/");
        let label = page.add_node(0, "label", &[], "");
        let div = page.add_node(label, "div", &[], "issue text");
        let nested = page.add_node(div, "div", &[], "nested");

        let hits = page.query_all("label > div").await.unwrap();
        assert_eq!(hits, vec![div as u64]);
        let _ = nested;
    }

    #[tokio::test]
    async fn test_descendant_combinator() {
        let page = FakePage::new("https://example.com/");
        let wrapper = page.add_node(0, "div", &["css-1geyss9"], "");
        let inner = page.add_node(wrapper, "div", &[], "");
        let input = page.add_node(inner, "input", &[], "");

        assert_eq!(
            page.query(".css-1geyss9 input").await.unwrap(),
            Some(input as u64)
        );
    }

    #[tokio::test]
    async fn test_attr_eq_selector() {
        let page = FakePage::new("https://example.com/");
        let input = page.add_node(0, "input", &["css-ys1hc6"], "");
        page.set_attr(input, "placeholder", "Transporter ID");

        assert_eq!(
            page.query("input[class=\"css-ys1hc6\"][placeholder=\"Transporter ID\"]")
                .await
                .unwrap(),
            Some(input as u64)
        );
    }

    #[tokio::test]
    async fn test_text_includes_children() {
        let page = FakePage::new("https://example.com/");
        let button = page.add_node(0, "button", &[], "");
        page.add_node(button, "span", &[], "Upload inspection");

        assert_eq!(
            page.text(button as u64).await.unwrap().trim(),
            "Upload inspection"
        );
    }

    #[tokio::test]
    async fn test_radio_click_unchecks_siblings() {
        let page = FakePage::new("https://example.com/");
        let a = page.add_node(0, "input", &[], "");
        page.set_attr(a, "type", "radio");
        page.set_attr(a, "name", "group");
        let b = page.add_node(0, "input", &[], "");
        page.set_attr(b, "type", "radio");
        page.set_attr(b, "name", "group");

        page.click(a as u64).await.unwrap();
        assert!(page.node_checked(a));
        page.click(b as u64).await.unwrap();
        assert!(page.node_checked(b));
        assert!(!page.node_checked(a));
    }

    #[tokio::test]
    async fn test_injected_button_lifecycle() {
        let page = FakePage::new("https://example.com/");
        let upload = page.add_node(0, "button", &["css-z4yfkz"], "Upload inspection");

        page.inject_action_button(upload as u64).await.unwrap();
        assert!(page.action_button_present());

        page.remove_action_button().await.unwrap();
        assert!(!page.action_button_present());
    }
}
