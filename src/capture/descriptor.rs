//! Element Descriptor derivation.
//!
//! Given a `RawElement` snapshot (target node plus ancestor chain) this
//! module produces the human-legible, moderately stable identity used by
//! the recorder and the step synthesizer. Derived fresh per observation;
//! nothing here tracks identity across DOM mutations.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::models::{ElementDescriptor, RawElement, RawNode};

use super::truncate_chars;

/// Max ancestor levels (including the target) inspected for the selector.
const MAX_SELECTOR_DEPTH: usize = 6;
/// Selectors longer than this collapse to their last segments.
const MAX_SELECTOR_CHARS: usize = 150;
const COLLAPSED_SEGMENTS: usize = 3;
/// Own text shorter than this earns a :contains() token.
const MAX_CONTAINS_CHARS: usize = 50;
const MAX_VALUE_CHARS: usize = 200;
const MAX_TEXT_CHARS: usize = 100;
/// Ancestor levels searched for text context when the element has none.
const MAX_TEXT_CONTEXT_DEPTH: usize = 3;

/// Attribute priority for selector segments, first match wins.
const PRIORITY_ATTRIBUTES: [&str; 7] = [
    "placeholder",
    "title",
    "aria-label",
    "data-testid",
    "data-qa",
    "type",
    "role",
];

/// Fixed allow-list for the descriptor's attribute map.
const ALLOWED_ATTRIBUTES: [&str; 9] = [
    "placeholder",
    "title",
    "aria-label",
    "data-testid",
    "data-qa",
    "type",
    "role",
    "href",
    "alt",
];

fn safe_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("static regex"))
}

fn digit_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4,}").expect("static regex"))
}

/// Derive the descriptor for a snapshotted element. Total: garbage input
/// degrades to `ElementDescriptor::unknown()`, never an error.
pub fn describe(raw: &RawElement) -> ElementDescriptor {
    let tag = raw.node.tag.trim().to_lowercase();
    if tag.is_empty() {
        return ElementDescriptor::unknown();
    }

    let input_type = raw.input_type.as_ref().map(|t| t.to_lowercase());
    let is_checkbox = input_type.as_deref() == Some("checkbox");
    let is_radio = input_type.as_deref() == Some("radio");

    let value = raw.value.as_ref().map(|v| {
        if input_type.as_deref() == Some("password") {
            format!("***{} chars***", v.chars().count())
        } else {
            truncate_chars(v, MAX_VALUE_CHARS)
        }
    });

    let own_text = nonempty(raw.node.text.as_deref());
    let text = own_text
        .map(|t| truncate_chars(t, MAX_TEXT_CHARS))
        .or_else(|| ancestor_text_context(raw).map(|t| truncate_chars(t, MAX_TEXT_CHARS)));

    let attributes: HashMap<String, String> = raw
        .node
        .attributes
        .iter()
        .filter(|(k, _)| ALLOWED_ATTRIBUTES.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    ElementDescriptor {
        tag,
        input_type,
        id: nonempty(raw.node.id.as_deref()).map(str::to_string),
        name: nonempty(raw.node.name.as_deref()).map(str::to_string),
        class_name: nonempty(raw.node.class_name.as_deref()).map(str::to_string),
        placeholder: nonempty(raw.placeholder.as_deref()).map(str::to_string),
        value,
        text,
        label: nonempty(raw.label.as_deref()).map(str::to_string),
        selector: build_selector(raw),
        attributes,
        position: raw.position,
        is_visible: raw.is_visible,
        is_checkbox,
        is_radio,
        checked: raw.checked,
    }
}

/// Structural selector path, walking from the target up to six levels or
/// the document root. Per level the first matching discriminator wins; an
/// `id` or form `name` terminates the walk since it is assumed unique.
pub fn build_selector(raw: &RawElement) -> String {
    let mut segments: Vec<String> = Vec::new();

    let levels = std::iter::once(&raw.node).chain(raw.ancestors.iter());
    for (depth, node) in levels.take(MAX_SELECTOR_DEPTH).enumerate() {
        let tag = node.tag.trim().to_lowercase();
        if tag.is_empty() || tag == "html" || tag == "body" {
            break;
        }

        let (mut segment, terminal) = level_segment(node, &tag, depth == 0, raw);
        if depth == 0 {
            if let Some(text) = nonempty(node.text.as_deref()) {
                if text.chars().count() < MAX_CONTAINS_CHARS {
                    segment.push_str(&format!(":contains(\"{}\")", escape_quotes(text)));
                }
            }
        }
        segments.push(segment);
        if terminal {
            break;
        }
    }

    segments.reverse();
    let selector = segments.join(" > ");
    if selector.chars().count() > MAX_SELECTOR_CHARS && segments.len() > COLLAPSED_SEGMENTS {
        segments[segments.len() - COLLAPSED_SEGMENTS..].join(" > ")
    } else {
        selector
    }
}

/// One selector segment for a node. Returns (segment, terminates-walk).
fn level_segment(node: &RawNode, tag: &str, is_target: bool, raw: &RawElement) -> (String, bool) {
    if let Some(id) = nonempty(node.id.as_deref()) {
        if safe_id_re().is_match(id) {
            return (format!("#{}", id), true);
        }
    }

    if is_form_like(tag) {
        if let Some(name) = nonempty(node.name.as_deref()) {
            return (format!("{}[name=\"{}\"]", tag, escape_quotes(name)), true);
        }
    }

    let classes = meaningful_classes(node.class_name.as_deref());
    if !classes.is_empty() {
        return (format!("{}.{}", tag, classes.join(".")), false);
    }

    for attr in PRIORITY_ATTRIBUTES {
        let value = node
            .attributes
            .get(attr)
            .map(String::as_str)
            .or_else(|| target_fallback_attr(attr, is_target, raw));
        if let Some(value) = nonempty(value) {
            return (format!("{}[{}=\"{}\"]", tag, attr, escape_quotes(value)), false);
        }
    }

    match node.sibling_index {
        Some(n) if n > 0 => (format!("{}:nth-child({})", tag, n), false),
        _ => (tag.to_string(), false),
    }
}

/// The target node's placeholder/type often arrive as dedicated snapshot
/// fields rather than in the attribute map.
fn target_fallback_attr<'a>(attr: &str, is_target: bool, raw: &'a RawElement) -> Option<&'a str> {
    if !is_target {
        return None;
    }
    match attr {
        "placeholder" => raw.placeholder.as_deref(),
        "type" => raw.input_type.as_deref(),
        _ => None,
    }
}

/// Up to two classes that look authored rather than generated. Utility and
/// build-artifact classes (very long, `js-` prefixed, BEM modifiers,
/// hashed digit runs) are excluded.
fn meaningful_classes(class_name: Option<&str>) -> Vec<String> {
    let Some(class_name) = class_name else {
        return Vec::new();
    };
    class_name
        .split_whitespace()
        .filter(|c| {
            c.len() < 20 && !c.starts_with("js-") && !c.contains("--") && !digit_run_re().is_match(c)
        })
        .take(2)
        .map(str::to_string)
        .collect()
}

fn is_form_like(tag: &str) -> bool {
    matches!(tag, "input" | "select" | "textarea" | "button" | "form")
}

/// First non-empty ancestor text (up to three levels) differing from the
/// element's own text.
fn ancestor_text_context(raw: &RawElement) -> Option<&str> {
    let own = raw.node.text.as_deref().map(str::trim).unwrap_or("");
    raw.ancestors
        .iter()
        .take(MAX_TEXT_CONTEXT_DEPTH)
        .filter_map(|a| nonempty(a.text.as_deref()))
        .find(|t| *t != own)
}

fn escape_quotes(s: &str) -> String {
    s.replace('"', "\\\"")
}

fn nonempty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;

    fn node(tag: &str) -> RawNode {
        RawNode {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    fn element(tag: &str) -> RawElement {
        RawElement {
            node: node(tag),
            ..Default::default()
        }
    }

    #[test]
    fn safe_id_terminates_walk() {
        let mut raw = element("button");
        raw.node.id = Some("submit-btn".to_string());
        raw.ancestors = vec![node("div"), node("form")];
        assert_eq!(build_selector(&raw), "#submit-btn");
    }

    #[test]
    fn unsafe_id_is_skipped() {
        let mut raw = element("div");
        raw.node.id = Some("42:auto-generated".to_string());
        raw.node.sibling_index = Some(3);
        assert_eq!(build_selector(&raw), "div:nth-child(3)");
    }

    #[test]
    fn form_name_terminates_walk() {
        let mut raw = element("input");
        raw.node.name = Some("email".to_string());
        raw.ancestors = vec![node("div")];
        assert_eq!(build_selector(&raw), "input[name=\"email\"]");
    }

    #[test]
    fn utility_classes_are_filtered() {
        let mut raw = element("span");
        raw.node.class_name = Some(
            "js-hook price price--discounted sc-bdVaJa-generated-20240101 label".to_string(),
        );
        assert_eq!(build_selector(&raw), "span.price.label");
    }

    #[test]
    fn priority_attribute_beats_nth_child() {
        let mut raw = element("input");
        raw.node
            .attributes
            .insert("placeholder".to_string(), "Поиск".to_string());
        raw.node.sibling_index = Some(2);
        assert_eq!(build_selector(&raw), "input[placeholder=\"Поиск\"]");
    }

    #[test]
    fn ancestor_id_anchors_the_path() {
        let mut raw = element("span");
        raw.node.sibling_index = Some(1);
        let mut parent = node("div");
        parent.class_name = Some("row".to_string());
        let mut grand = node("section");
        grand.id = Some("checkout".to_string());
        raw.ancestors = vec![parent, grand, node("main")];
        assert_eq!(build_selector(&raw), "#checkout > div.row > span:nth-child(1)");
    }

    #[test]
    fn short_text_adds_contains_token() {
        let mut raw = element("button");
        raw.node.text = Some("Submit".to_string());
        assert_eq!(build_selector(&raw), "button:contains(\"Submit\")");
    }

    #[test]
    fn long_text_gets_no_contains_token() {
        let mut raw = element("p");
        raw.node.text = Some("x".repeat(60));
        assert_eq!(build_selector(&raw), "p");
    }

    #[test]
    fn overlong_selector_collapses_to_last_three_segments() {
        let mut raw = element("span");
        raw.node
            .attributes
            .insert("title".to_string(), "y".repeat(40));
        let mut ancestors = Vec::new();
        for i in 0..5 {
            let mut a = node("div");
            a.attributes
                .insert("title".to_string(), format!("{}{}", "x".repeat(38), i));
            ancestors.push(a);
        }
        raw.ancestors = ancestors;

        let selector = build_selector(&raw);
        assert_eq!(selector.matches(" > ").count(), 2, "selector: {selector}");
        assert!(selector.ends_with("span[title=\"yyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyy\"]"));
    }

    #[test]
    fn password_values_are_redacted() {
        let mut raw = element("input");
        raw.input_type = Some("password".to_string());
        raw.value = Some("hunter22".to_string());
        let descriptor = describe(&raw);
        assert_eq!(descriptor.value.as_deref(), Some("***8 chars***"));
    }

    #[test]
    fn text_context_falls_back_to_ancestors() {
        let mut raw = element("input");
        let mut parent = node("div");
        parent.text = Some("Адрес доставки".to_string());
        raw.ancestors = vec![node("span"), parent];
        let descriptor = describe(&raw);
        assert_eq!(descriptor.text.as_deref(), Some("Адрес доставки"));
    }

    #[test]
    fn empty_snapshot_degrades_to_unknown() {
        let raw = RawElement::default();
        let descriptor = describe(&raw);
        assert_eq!(descriptor.tag, "unknown");
        assert_eq!(descriptor.selector, "");
    }

    #[test]
    fn descriptor_keeps_allowed_attributes_only() {
        let mut raw = element("a");
        raw.node
            .attributes
            .insert("href".to_string(), "/cart".to_string());
        raw.node
            .attributes
            .insert("onclick".to_string(), "evil()".to_string());
        raw.position = Some(Position { x: 1, y: 2, w: 3, h: 4 });
        let descriptor = describe(&raw);
        assert_eq!(descriptor.attributes.get("href").map(String::as_str), Some("/cart"));
        assert!(!descriptor.attributes.contains_key("onclick"));
    }
}
