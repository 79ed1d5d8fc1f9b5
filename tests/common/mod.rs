pub mod fixtures;

use serde::Serialize;
use zpt::{RenderingConfig, ZptError, ZptTemplate};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub const TAL_NS: &str = "http://xml.zope.org/namespaces/tal";
pub const METAL_NS: &str = "http://xml.zope.org/namespaces/metal";

/// Wraps `body` in a root element declaring the `tal` and `metal` prefixes.
pub fn page(body: &str) -> String {
    format!("<html xmlns:tal=\"{TAL_NS}\" xmlns:metal=\"{METAL_NS}\">{body}</html>")
}

/// Renders `body` inside [`page`] and returns the markup between the root tags.
pub fn render_body<T: Serialize + ?Sized>(body: &str, model: &T) -> Result<String, ZptError> {
    render_body_with(body, model, RenderingConfig::default())
}

pub fn render_body_with<T: Serialize + ?Sized>(
    body: &str,
    model: &T,
    config: RenderingConfig,
) -> Result<String, ZptError> {
    let output = ZptTemplate::parse(&page(body))?
        .with_config(config)
        .render_to_string(model)?;
    Ok(strip_root(&output))
}

/// The markup between `<html>` and `</html>`; `<html/>` gives an empty string.
pub fn strip_root(output: &str) -> String {
    output
        .strip_prefix("<html>")
        .and_then(|rest| rest.strip_suffix("</html>"))
        .unwrap_or("")
        .to_string()
}
