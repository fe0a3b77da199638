//! Action Grouper: collapses a raw action sequence into report-worthy
//! units before narration.
//!
//! Consecutive INPUT actions on the same selector within the merge window
//! become one `InputGroup` keeping the final value; pure noise (focus,
//! responses, error echoes) is dropped entirely. Checkbox and radio
//! actions pass through: they are discrete committed choices, not
//! continuous typing.

use serde::{Deserialize, Serialize};

use crate::models::{ActionDetail, ActionRecord, ElementDescriptor};

/// A unit the synthesizer can narrate. Already-built `InputGroup`s are
/// opaque to further grouping, which makes `group` idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepUnit {
    Action(ActionRecord),
    InputGroup {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        element: Option<ElementDescriptor>,
        selector: String,
        /// Final value after the whole typing run.
        value: String,
        url: String,
        started_at: i64,
        last_at: i64,
    },
}

impl StepUnit {
    pub fn timestamp(&self) -> i64 {
        match self {
            StepUnit::Action(a) => a.timestamp,
            StepUnit::InputGroup { last_at, .. } => *last_at,
        }
    }
}

/// Wrap raw actions for grouping.
pub fn units_from_actions(actions: &[ActionRecord]) -> Vec<StepUnit> {
    actions.iter().cloned().map(StepUnit::Action).collect()
}

struct PendingInput {
    element: Option<ElementDescriptor>,
    selector: String,
    value: String,
    url: String,
    started_at: i64,
    last_at: i64,
}

impl PendingInput {
    fn into_unit(self) -> StepUnit {
        StepUnit::InputGroup {
            element: self.element,
            selector: self.selector,
            value: self.value,
            url: self.url,
            started_at: self.started_at,
            last_at: self.last_at,
        }
    }
}

/// Collapse a unit sequence. `input_merge_ms` is the max gap between two
/// INPUT actions on the same selector that still reads as one typing run.
pub fn group(units: Vec<StepUnit>, input_merge_ms: i64) -> Vec<StepUnit> {
    let mut out: Vec<StepUnit> = Vec::with_capacity(units.len());
    let mut pending: Option<PendingInput> = None;

    for unit in units {
        match unit {
            StepUnit::Action(action) => {
                if let ActionDetail::Input { value } = &action.detail {
                    let selector = action.selector().to_string();
                    match pending.as_mut() {
                        Some(p)
                            if p.selector == selector
                                && action.timestamp - p.last_at < input_merge_ms =>
                        {
                            p.value = value.clone();
                            p.last_at = action.timestamp;
                        }
                        _ => {
                            if let Some(p) = pending.take() {
                                out.push(p.into_unit());
                            }
                            pending = Some(PendingInput {
                                element: action.element.clone(),
                                selector,
                                value: value.clone(),
                                url: action.url.clone(),
                                started_at: action.timestamp,
                                last_at: action.timestamp,
                            });
                        }
                    }
                    continue;
                }

                // Every non-INPUT action closes the typing run first.
                if let Some(p) = pending.take() {
                    out.push(p.into_unit());
                }
                if !is_noise(&action) {
                    out.push(StepUnit::Action(action));
                }
            }
            // Opaque pass-through keeps grouping idempotent.
            group_unit @ StepUnit::InputGroup { .. } => {
                if let Some(p) = pending.take() {
                    out.push(p.into_unit());
                }
                out.push(group_unit);
            }
        }
    }

    if let Some(p) = pending.take() {
        out.push(p.into_unit());
    }

    out
}

/// Actions that never become steps: transient focus, raw clicks on
/// checkbox/radio controls (the toggle event supersedes them), network
/// completions and the error echoes themselves.
fn is_noise(action: &ActionRecord) -> bool {
    match &action.detail {
        ActionDetail::Focus
        | ActionDetail::ConsoleErrorLog { .. }
        | ActionDetail::WindowError { .. }
        | ActionDetail::FetchResponse { .. }
        | ActionDetail::XhrResponse { .. }
        | ActionDetail::FetchError { .. } => true,
        ActionDetail::Click => action
            .element
            .as_ref()
            .map(|e| e.is_checkbox || e.is_radio)
            .unwrap_or(false),
        ActionDetail::Input { .. }
        | ActionDetail::CheckboxToggle { .. }
        | ActionDetail::RadioSelect { .. }
        | ActionDetail::SelectChange { .. }
        | ActionDetail::FormSubmit { .. }
        | ActionDetail::Navigation { .. }
        | ActionDetail::XhrRequest { .. }
        | ActionDetail::FetchRequest { .. } => false,
    }
}
