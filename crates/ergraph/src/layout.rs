//! Port and node geometry
//!
//! Ports stack below the node header, one row each. Node height follows
//! from the number of visible ports. Each port row is split into a name
//! region and a type region whose widths depend on the diagram-wide node
//! width.

use crate::core::{DiagramConfig, RowMargins};

/// Offset of a port row relative to its node's top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortOffset {
    pub x: u32,
    pub y: u32,
}

/// Horizontal split of a port row into name and type regions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSplit {
    pub name_x: f64,
    pub name_width: f64,
    pub type_x: f64,
    pub type_width: f64,
}

impl RowSplit {
    /// Right edge of the type region
    pub fn type_end(&self) -> f64 {
        self.type_x + self.type_width
    }
}

/// Layout engine for ER nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutEngine {
    header_height: u32,
    port_row_height: u32,
    margins: RowMargins,
}

impl LayoutEngine {
    pub fn new(config: &DiagramConfig) -> Self {
        Self {
            header_height: config.header_height,
            port_row_height: config.port_row_height,
            margins: config.row_margins,
        }
    }

    pub fn header_height(&self) -> u32 {
        self.header_height
    }

    pub fn port_row_height(&self) -> u32 {
        self.port_row_height
    }

    /// Offset of the `index`-th visible port (0-based)
    pub fn port_offset(&self, index: usize) -> PortOffset {
        PortOffset {
            x: 0,
            y: self.header_height + index as u32 * self.port_row_height,
        }
    }

    /// Height of a node showing `visible_ports` port rows
    pub fn node_height(&self, visible_ports: usize) -> u32 {
        self.header_height + visible_ports as u32 * self.port_row_height
    }

    /// Height of a collapsed node: the header only
    pub fn collapsed_height(&self) -> u32 {
        self.header_height
    }

    /// Split a port row of total width `width`
    ///
    /// The name region takes three fifths of the row less the left margin;
    /// the type region fills the rest up to the right margin.
    pub fn row_split(&self, width: u32) -> RowSplit {
        let w = width as f64;
        let m1 = self.margins.name_left as f64;
        let m2 = self.margins.gap as f64;
        let m3 = self.margins.type_right as f64;

        let name_width = w * 3.0 / 5.0 - m1;
        let type_x = m1 + name_width + m2;
        let type_width = w - m1 - name_width - m2 - m3;

        RowSplit {
            name_x: m1,
            name_width,
            type_x,
            type_width,
        }
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(&DiagramConfig::default())
    }
}

/// Grid placement for nodes that arrive without a position
///
/// Nodes fill rows of `columns` cells left to right; each row starts below
/// the tallest node of the previous row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPlacement {
    columns: usize,
    spacing: u32,
}

impl GridPlacement {
    pub fn new(columns: usize, spacing: u32) -> Self {
        Self {
            columns: columns.max(1),
            spacing,
        }
    }

    /// Positions for nodes of the given `(width, height)` sizes, starting at
    /// `(0, origin_y)`
    pub fn place(&self, sizes: &[(u32, u32)], origin_y: i32) -> Vec<(i32, i32)> {
        let mut positions = Vec::with_capacity(sizes.len());
        let mut row_y = origin_y;

        for row in sizes.chunks(self.columns) {
            let mut x = 0i32;
            let mut row_height = 0u32;
            for &(width, height) in row {
                positions.push((x, row_y));
                x += (width + self.spacing) as i32;
                row_height = row_height.max(height);
            }
            row_y += (row_height + self.spacing) as i32;
        }

        positions
    }
}

impl Default for GridPlacement {
    fn default() -> Self {
        Self::new(4, 50)
    }
}
