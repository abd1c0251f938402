//! Core type definitions for diagram processing
//!
//! Shapes, geometry and export formats shared across the model, the render
//! adapter and the export engine.

use std::fmt;

/// Node shapes known to the rendering engine
///
/// Only the ER rectangle exists today. New variants are added here without
/// touching layout or export, which work on the Node/Port/Edge contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum NodeShape {
    /// Header row plus one row per port: `er-rect`
    #[default]
    ErRect,
}

impl NodeShape {
    /// Shape name registered with the rendering engine
    pub fn name(&self) -> &'static str {
        match self {
            NodeShape::ErRect => "er-rect",
        }
    }
}

impl fmt::Display for NodeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Collapse indicator shown in the node header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum CollapseGlyph {
    /// Node is expanded; activating the glyph collapses it
    #[default]
    Minus,
    /// Node is collapsed; activating the glyph expands it
    Plus,
}

impl fmt::Display for CollapseGlyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollapseGlyph::Minus => write!(f, "-"),
            CollapseGlyph::Plus => write!(f, "+"),
        }
    }
}

/// Axis-aligned rectangle in diagram coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Export target formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Raster image rendered by the external rendering engine
    Png,
    /// draw.io interchange XML
    Drawio,
}

/// Base name used for every exported file
pub const EXPORT_FILE_STEM: &str = "模型图";

impl ExportFormat {
    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Drawio => "drawio",
        }
    }

    /// MIME type for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Drawio => "text/xml;charset=utf-8",
        }
    }

    /// Download file name (`模型图.drawio`, `模型图.png`)
    pub fn file_name(&self) -> String {
        format!("{}.{}", EXPORT_FILE_STEM, self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Png => write!(f, "png"),
            ExportFormat::Drawio => write!(f, "drawio"),
        }
    }
}
