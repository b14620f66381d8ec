//! Page and raw document rendering.

use minijinja::{context, AutoEscape, Environment};
use std::sync::LazyLock;

use super::view::build_views;
use crate::domain::InspectorError;
use crate::profiler::Profiler;

pub(crate) const PAGE_TEMPLATE: &str = "index.html";

static ENV: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    if let Err(err) = env.add_template(PAGE_TEMPLATE, include_str!("../../templates/index.html")) {
        log::error!("Inspector template failed to compile: {err}");
    }
    env
});

/// Render the inspector page for the current cache contents.
///
/// # Errors
/// Returns [`InspectorError::RenderFailed`] when the template cannot be
/// rendered.
pub fn render_page(profiler: &Profiler) -> Result<String, InspectorError> {
    let thresholds = profiler.thresholds();
    let scopes = build_views(&profiler.snapshot(), &thresholds);

    let template = ENV.get_template(PAGE_TEMPLATE)?;
    Ok(template.render(context! { scopes => scopes, capacity => profiler.cache().capacity() })?)
}

/// Pretty-printed JSON of every retained scope, newest first.
///
/// # Errors
/// Returns [`InspectorError::SerializationFailed`] if serialization fails.
pub fn raw_document(profiler: &Profiler) -> Result<String, InspectorError> {
    Ok(serde_json::to_string_pretty(&profiler.snapshot())?)
}
