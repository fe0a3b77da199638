//! Reproduction Synthesizer: turns the buffered actions preceding an error
//! into a numbered, human-readable script.
//!
//! Step templates stay Russian, matching the notification UI of the
//! extension this sidecar serves. Output is a plain newline-joined string,
//! meant for direct display and copy.

use crate::config::CaptureConfig;
use crate::models::{ActionDetail, ActionRecord, ElementDescriptor};

use super::grouper::{group, units_from_actions, StepUnit};
use super::{pathname, truncate_ellipsis};

/// Defined empty result when no buffered action falls inside the error's
/// trailing window. Not an error.
pub const NO_STEPS_PLACEHOLDER: &str =
    "Не удалось автоматически определить шаги воспроизведения";

/// At most this many buffered actions feed one reproduction script.
const MAX_SOURCE_ACTIONS: usize = 20;
const MAX_MESSAGE_CHARS: usize = 80;
const MAX_VALUE_CHARS: usize = 30;
const MAX_TEXT_CHARS: usize = 50;

/// Build the reproduction script for an error at `error_timestamp`.
///
/// Only actions within the trailing `action_timeout_ms` window qualify; of
/// those, the most recent twenty. With no qualifying actions the fixed
/// placeholder is returned alone, without the final error line.
pub fn synthesize(
    actions: &[ActionRecord],
    error_timestamp: i64,
    error_message: &str,
    config: &CaptureConfig,
) -> String {
    let qualifying: Vec<&ActionRecord> = actions
        .iter()
        .filter(|a| error_timestamp - a.timestamp <= config.action_timeout_ms)
        .collect();
    if qualifying.is_empty() {
        return NO_STEPS_PLACEHOLDER.to_string();
    }

    let start = qualifying.len().saturating_sub(MAX_SOURCE_ACTIONS);
    let window: Vec<ActionRecord> = qualifying[start..].iter().map(|a| (*a).clone()).collect();

    let units = group(units_from_actions(&window), config.input_merge_ms);

    let mut lines: Vec<String> = Vec::with_capacity(units.len() + 1);
    for unit in &units {
        if let Some(text) = render_unit(unit) {
            lines.push(format!("{}. {}", lines.len() + 1, text));
        }
    }
    lines.push(format!(
        "{}. Ошибка: {}",
        lines.len() + 1,
        truncate_ellipsis(error_message, MAX_MESSAGE_CHARS)
    ));

    lines.join("\n")
}

/// One narrated line per unit; `None` means the kind is not worth a step.
fn render_unit(unit: &StepUnit) -> Option<String> {
    match unit {
        StepUnit::InputGroup { element, selector, value, .. } => {
            let field = field_name(element.as_ref(), selector);
            Some(format!(
                "Ввести текст в поле \"{}\": \"{}\"",
                field,
                truncate_ellipsis(value, MAX_VALUE_CHARS)
            ))
        }
        StepUnit::Action(action) => render_action(action),
    }
}

fn render_action(action: &ActionRecord) -> Option<String> {
    let element = action.element.as_ref();
    match &action.detail {
        ActionDetail::Click => Some(render_click(element)),
        ActionDetail::CheckboxToggle { checked } => {
            let verb = if *checked { "Включить" } else { "Выключить" };
            Some(format!("{} чекбокс \"{}\"", verb, control_name(element)))
        }
        ActionDetail::RadioSelect { value } => {
            let name = element
                .and_then(|e| e.label.as_deref().or(e.text.as_deref()))
                .unwrap_or(value);
            Some(format!("Выбрать опцию \"{}\"", truncate_ellipsis(name, MAX_TEXT_CHARS)))
        }
        ActionDetail::SelectChange { value, text } => {
            let option = text.as_deref().filter(|t| !t.is_empty()).unwrap_or(value);
            Some(format!(
                "Выбрать \"{}\" в списке \"{}\"",
                truncate_ellipsis(option, MAX_TEXT_CHARS),
                field_name(element, action.selector())
            ))
        }
        ActionDetail::FormSubmit { form_id, action } => Some(match (form_id, action) {
            (Some(id), _) if !id.is_empty() => format!("Отправить форму #{}", id),
            (_, Some(path)) if !path.is_empty() => {
                format!("Отправить форму {}", pathname(path))
            }
            _ => "Отправить форму".to_string(),
        }),
        ActionDetail::Navigation { to } => {
            Some(format!("Перейти на страницу {}", pathname(to)))
        }
        ActionDetail::XhrRequest { method, url } | ActionDetail::FetchRequest { method, url } => {
            Some(format!("{} запрос к {}", method, pathname(url)))
        }
        // Raw inputs never reach here grouped; the rest is filtered noise,
        // skipped silently with no numbering gap.
        ActionDetail::Input { .. }
        | ActionDetail::Focus
        | ActionDetail::XhrResponse { .. }
        | ActionDetail::FetchResponse { .. }
        | ActionDetail::FetchError { .. }
        | ActionDetail::WindowError { .. }
        | ActionDetail::ConsoleErrorLog { .. } => None,
    }
}

/// Click target naming: visible text, then label, then the ancestor text
/// context folded into the descriptor, then the selector tail, then raw
/// coordinates as last resort.
fn render_click(element: Option<&ElementDescriptor>) -> String {
    let Some(el) = element else {
        return "Кликнуть на элемент unknown".to_string();
    };
    if let Some(text) = el.text.as_deref().filter(|t| !t.is_empty()) {
        return format!("Кликнуть на \"{}\"", truncate_ellipsis(text, MAX_TEXT_CHARS));
    }
    if let Some(label) = el.label.as_deref().filter(|l| !l.is_empty()) {
        return format!("Кликнуть на \"{}\"", truncate_ellipsis(label, MAX_TEXT_CHARS));
    }
    if let Some(tail) = el.selector_tail() {
        return format!("Кликнуть на элемент {}", tail);
    }
    if let Some(pos) = el.position {
        return format!("Кликнуть по координатам ({}, {})", pos.x, pos.y);
    }
    format!("Кликнуть на элемент {}", el.tag)
}

/// Checkbox/radio naming: label, visible text, name, selector tail.
fn control_name(element: Option<&ElementDescriptor>) -> String {
    if let Some(el) = element {
        for candidate in [&el.label, &el.text, &el.name] {
            if let Some(value) = candidate.as_deref().filter(|v| !v.is_empty()) {
                return truncate_ellipsis(value, MAX_TEXT_CHARS);
            }
        }
        if let Some(tail) = el.selector_tail() {
            return tail.to_string();
        }
    }
    "без названия".to_string()
}

/// Field naming for inputs and selects: name, placeholder, label, visible
/// text, selector tail.
fn field_name(element: Option<&ElementDescriptor>, selector: &str) -> String {
    if let Some(el) = element {
        for candidate in [&el.name, &el.placeholder, &el.label, &el.text] {
            if let Some(value) = candidate.as_deref().filter(|v| !v.is_empty()) {
                return truncate_ellipsis(value, MAX_TEXT_CHARS);
            }
        }
        if let Some(tail) = el.selector_tail() {
            return tail.to_string();
        }
    }
    let tail = selector.rsplit(" > ").next().unwrap_or("").trim();
    if tail.is_empty() {
        "ввода".to_string()
    } else {
        tail.to_string()
    }
}
