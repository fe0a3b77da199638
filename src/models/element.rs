use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bounding box of an element at observation time, viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// One DOM node as snapshotted by the page script. Used both for the
/// target element itself and for its ancestor chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(default)]
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
    /// The node's own trimmed text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// 1-based position among element siblings, for :nth-child fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sibling_index: Option<u32>,
}

/// Element snapshot attached to an interaction event: the target node plus
/// up to six ancestors (nearest first) and form-specific state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawElement {
    #[serde(flatten)]
    pub node: RawNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Text of the associated <label>, resolved by the page script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ancestors: Vec<RawNode>,
}

/// Best-effort structural identity of a DOM element, derived fresh on each
/// observation. Not a stable handle: no identity is tracked across DOM
/// mutations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    pub tag: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Truncated to 200 chars; password inputs carry a length-only
    /// placeholder instead of content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Own text, or nearest-ancestor text context. Truncated to 100 chars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub selector: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
    #[serde(default)]
    pub is_checkbox: bool,
    #[serde(default)]
    pub is_radio: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

impl ElementDescriptor {
    /// Minimal descriptor used when inspecting the target failed or the
    /// event carried no usable snapshot.
    pub fn unknown() -> Self {
        Self {
            tag: "unknown".to_string(),
            selector: String::new(),
            ..Default::default()
        }
    }

    /// Last segment of the structural selector path.
    pub fn selector_tail(&self) -> Option<&str> {
        let tail = self.selector.rsplit(" > ").next()?.trim();
        if tail.is_empty() {
            None
        } else {
            Some(tail)
        }
    }
}
