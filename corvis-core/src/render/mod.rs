pub mod html;
pub mod json;
pub mod traits;
pub mod visualizer;

pub use traits::{Renderer, VisualizationData};
pub use visualizer::{Visualizer, VisualizeStats};

use crate::error::RenderError;

/// Output formats a visualizer can produce.
pub const KNOWN_FORMATS: [&str; 2] = ["html", "json"];

/// Look up a renderer by format name.
pub fn build_renderer(format: &str) -> Result<Box<dyn Renderer>, RenderError> {
    match format {
        "html" => Ok(Box::new(html::HtmlRenderer)),
        "json" => Ok(Box::new(json::JsonRenderer)),
        other => Err(RenderError::UnknownFormat(other.to_string())),
    }
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
