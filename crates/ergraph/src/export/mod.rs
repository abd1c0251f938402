//! Export engine
//!
//! Interchange XML is produced here from the canonical model. Raster
//! images are delegated to the external rendering engine through
//! [`RasterExporter`]; this module only supplies naming and bounds.

mod drawio;
mod xml;

pub use drawio::*;
pub use xml::*;

use crate::core::{ExportFormat, Rect, RASTER_EXPORT_PADDING};
use crate::render::RenderSurface;

/// A finished export, ready to be written or downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn new(format: ExportFormat, bytes: Vec<u8>) -> Self {
        Self {
            format,
            file_name: format.file_name(),
            mime_type: format.mime_type(),
            bytes,
        }
    }
}

/// Options handed to the external raster renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterOptions {
    /// Blank margin on every side of the content
    pub padding: u32,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            padding: RASTER_EXPORT_PADDING,
        }
    }
}

/// External renderer able to rasterize what is currently on a surface
pub trait RasterExporter<S: RenderSurface> {
    /// Encoded image bytes (PNG) of the visible content
    fn export_raster(&self, surface: &S, options: &RasterOptions) -> anyhow::Result<Vec<u8>>;
}

/// Bounding box of every node on `surface`, grown by `padding` per side
///
/// Returns `None` for an empty surface.
pub fn raster_bounds<S: RenderSurface>(surface: &S, padding: u32) -> Option<Rect> {
    let mut nodes = surface.nodes();
    let first = nodes.next()?.rect;
    let (mut left, mut top) = (first.x, first.y);
    let mut right = first.x + first.width as i32;
    let mut bottom = first.y + first.height as i32;
    for node in nodes {
        let r = node.rect;
        left = left.min(r.x);
        top = top.min(r.y);
        right = right.max(r.x + r.width as i32);
        bottom = bottom.max(r.y + r.height as i32);
    }
    let pad = padding as i32;
    Some(Rect::new(
        left - pad,
        top - pad,
        (right - left + 2 * pad) as u32,
        (bottom - top + 2 * pad) as u32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CollapseGlyph, NodeShape};
    use crate::render::{NodeView, SceneSurface};

    fn node(id: &str, rect: Rect) -> NodeView {
        NodeView {
            id: id.to_string(),
            shape: NodeShape::ErRect,
            rect,
            label: String::new(),
            label_display: String::new(),
            title: None,
            glyph: CollapseGlyph::Minus,
            ports: Vec::new(),
        }
    }

    #[test]
    fn test_raster_bounds_cover_all_nodes() {
        let mut surface = SceneSurface::new();
        assert_eq!(raster_bounds(&surface, 20), None);

        surface.add_node(node("A", Rect::new(0, 0, 160, 78)));
        surface.add_node(node("B", Rect::new(300, 100, 160, 30)));
        assert_eq!(
            raster_bounds(&surface, 20),
            Some(Rect::new(-20, -20, 500, 170))
        );
    }

    #[test]
    fn test_png_artifact_naming() {
        let artifact = ExportArtifact::new(ExportFormat::Png, vec![0x89, b'P']);
        assert_eq!(artifact.file_name, "模型图.png");
        assert_eq!(artifact.mime_type, "image/png");
        assert_eq!(RasterOptions::default().padding, 20);
    }
}
