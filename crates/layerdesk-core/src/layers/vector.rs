//! Vector layer content.

use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Size used when the markup carries neither dimensions nor a view box.
pub const DEFAULT_VECTOR_SIZE: Size = Size::new(100.0, 100.0);

/// An SVG document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub svg: String,
}

impl Vector {
    pub fn new(svg: impl Into<String>) -> Self {
        Self { svg: svg.into() }
    }

    /// Size taken from the root element's `width`/`height`, then its
    /// `viewBox`, then [`DEFAULT_VECTOR_SIZE`].
    pub fn intrinsic_size(&self) -> Size {
        let tag = root_tag(&self.svg);
        let width = attribute(tag, "width").and_then(parse_length);
        let height = attribute(tag, "height").and_then(parse_length);
        if let (Some(width), Some(height)) = (width, height) {
            return Size::new(width, height);
        }
        if let Some(view_box) = attribute(tag, "viewBox").and_then(parse_view_box) {
            return view_box;
        }
        DEFAULT_VECTOR_SIZE
    }
}

/// The opening `<svg ...>` tag, or the whole document if none is found.
fn root_tag(svg: &str) -> &str {
    let Some(start) = svg.find("<svg") else {
        return svg;
    };
    let rest = &svg[start..];
    match rest.find('>') {
        Some(end) => &rest[..end],
        None => rest,
    }
}

/// Value of a quoted attribute. The name must be preceded by whitespace so
/// that `stroke-width` does not match `width`.
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let mut search = 0;
    while let Some(found) = tag[search..].find(name) {
        let start = search + found;
        search = start + name.len();
        let preceded_by_space = tag[..start]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace);
        if !preceded_by_space {
            continue;
        }
        let rest = tag[search..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let rest = rest.trim_start();
        let quote = rest.chars().next()?;
        if quote != '"' && quote != '\'' {
            continue;
        }
        let value = &rest[1..];
        return value.find(quote).map(|end| &value[..end]);
    }
    None
}

/// Parse a plain or `px` length. Percentages and other units are rejected.
fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    let value = value.strip_suffix("px").unwrap_or(value);
    value.parse::<f64>().ok().filter(|v| *v > 0.0)
}

fn parse_view_box(value: &str) -> Option<Size> {
    let parts: Vec<f64> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [_, _, width, height] if *width > 0.0 && *height > 0.0 => Some(Size::new(*width, *height)),
        _ => None,
    }
}
