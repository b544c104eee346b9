//! Hidden-input extraction from the CAS login page.

use std::collections::HashMap;

use scraper::{Html, Selector};
use tracing::trace;

/// Hidden inputs that drive the login POST.
pub const FORM_PARAM_NAMES: [&str; 4] = ["lt", "source", "pid", "execution"];

/// Marker class on the login form's hidden inputs.
const FORM_INPUT_SELECTOR: &str = "input.for-form";

/// Collects the allow-listed hidden inputs of a login page.
///
/// Never fails: unparseable or unrelated HTML yields an empty map, and callers
/// treat missing names as empty strings. An input without a `value` maps to
/// the empty string.
#[must_use]
pub fn extract_form_params(html: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let Ok(selector) = Selector::parse(FORM_INPUT_SELECTOR) else {
        return params;
    };

    let document = Html::parse_document(html);
    for input in document.select(&selector) {
        let element = input.value();
        let Some(name) = element.attr("name") else {
            continue;
        };
        if FORM_PARAM_NAMES.contains(&name) {
            let value = element.attr("value").unwrap_or_default();
            params.insert(name.to_string(), value.to_string());
        }
    }

    trace!(found = params.len(), "extracted login form params");
    params
}
