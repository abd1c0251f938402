//! Diagram-wide geometry configuration
//!
//! Header height, port-row height and node width are shared by every node
//! in a diagram. Defaults match what the diagram server hands out when a
//! request carries no explicit parameters.

use std::time::Duration;

/// Smallest node width accepted from user input
pub const MIN_NODE_WIDTH: u32 = 50;
/// Largest node width accepted from user input
pub const MAX_NODE_WIDTH: u32 = 500;

/// Default height of the node header row
pub const DEFAULT_HEADER_HEIGHT: u32 = 40;
/// Default height of a single port row
pub const DEFAULT_PORT_ROW_HEIGHT: u32 = 24;
/// Default node width
pub const DEFAULT_NODE_WIDTH: u32 = 220;

/// Row height used for port cells in the interchange export,
/// independent of the live port row height
pub const EXPORT_ROW_HEIGHT: u32 = 24;

/// Two activations on the same target closer than this count as a double activation
pub const DOUBLE_ACTIVATION_INTERVAL: Duration = Duration::from_millis(300);
/// How long the "copied" confirmation stays on screen
pub const COPY_CONFIRMATION_DURATION: Duration = Duration::from_millis(1500);
/// Padding applied on every side of a raster export
pub const RASTER_EXPORT_PADDING: u32 = 20;

/// Fixed horizontal margins of a port row
///
/// A row is split into a name region and a type region:
/// `name_left | name | gap | type | type_right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowMargins {
    /// Margin before the name region (`m1`)
    pub name_left: u32,
    /// Gap between name and type regions (`m2`)
    pub gap: u32,
    /// Margin after the type region (`m3`)
    pub type_right: u32,
}

impl Default for RowMargins {
    fn default() -> Self {
        Self {
            name_left: 6,
            gap: 6,
            type_right: 6,
        }
    }
}

/// Geometry configuration for a diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagramConfig {
    pub header_height: u32,
    pub port_row_height: u32,
    pub node_width: u32,
    pub row_margins: RowMargins,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            header_height: DEFAULT_HEADER_HEIGHT,
            port_row_height: DEFAULT_PORT_ROW_HEIGHT,
            node_width: DEFAULT_NODE_WIDTH,
            row_margins: RowMargins::default(),
        }
    }
}

impl DiagramConfig {
    /// Create a config with explicit header/row heights and width
    pub fn new(header_height: u32, port_row_height: u32, node_width: u32) -> Self {
        Self {
            header_height,
            port_row_height,
            node_width,
            row_margins: RowMargins::default(),
        }
    }

    /// Defaults overlaid with `ERGRAPH_HEAD_HEIGHT`, `ERGRAPH_PORT_HEIGHT`
    /// and `ERGRAPH_NODE_WIDTH` when they hold valid integers
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_u32("ERGRAPH_HEAD_HEIGHT") {
            config.header_height = v;
        }
        if let Some(v) = env_u32("ERGRAPH_PORT_HEIGHT") {
            config.port_row_height = v;
        }
        if let Some(v) = env_u32("ERGRAPH_NODE_WIDTH") {
            config.node_width = v;
        }
        config
    }

    pub fn with_width(mut self, node_width: u32) -> Self {
        self.node_width = node_width;
        self
    }

    pub fn with_margins(mut self, row_margins: RowMargins) -> Self {
        self.row_margins = row_margins;
        self
    }
}

fn env_u32(key: &str) -> Option<u32> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = raw.as_str(), "Ignoring non-numeric environment override");
            None
        }
    }
}

/// Validate raw width input from the user
///
/// Accepts integers in `[MIN_NODE_WIDTH, MAX_NODE_WIDTH]`; anything else,
/// including non-numeric text, yields [`DiagramError::InvalidWidth`].
///
/// [`DiagramError::InvalidWidth`]: super::DiagramError::InvalidWidth
pub fn parse_width(input: &str) -> Result<u32, super::DiagramError> {
    let width: u32 = input
        .trim()
        .parse()
        .map_err(|_| super::DiagramError::invalid_width(input))?;
    if !(MIN_NODE_WIDTH..=MAX_NODE_WIDTH).contains(&width) {
        return Err(super::DiagramError::invalid_width(input));
    }
    Ok(width)
}
