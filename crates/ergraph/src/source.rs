//! Diagram data sources
//!
//! The data-fetch layer delivers three documents: the diagram payload
//! (optionally filtered by module group), the display-mode list and the
//! module-group list. [`DataSource`] is that seam; [`FileDataSource`] reads
//! JSON files and [`StaticDataSource`] serves in-memory data.

use anyhow::{anyhow, Result};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, span, Level};

use crate::core::{DiagramConfig, DEFAULT_HEADER_HEIGHT, DEFAULT_NODE_WIDTH, DEFAULT_PORT_ROW_HEIGHT};
use crate::model::{DiagramPayload, DisplayMode, DisplayModeRegistry, RawNode};

/// Group assigned to nodes that do not name one
pub const DEFAULT_MODULE_GROUP: &str = "其他";

/// Selector that keeps every group
pub const ALL_MODULE_GROUPS: &str = "ALL";

/// Geometry parameters sent along with a diagram request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutParams {
    pub head_height: u32,
    pub port_height: u32,
    pub width: u32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            head_height: DEFAULT_HEADER_HEIGHT,
            port_height: DEFAULT_PORT_ROW_HEIGHT,
            width: DEFAULT_NODE_WIDTH,
        }
    }
}

impl From<&DiagramConfig> for LayoutParams {
    fn from(config: &DiagramConfig) -> Self {
        Self {
            head_height: config.header_height,
            port_height: config.port_row_height,
            width: config.node_width,
        }
    }
}

/// The external data-fetch collaborator
pub trait DataSource {
    /// Diagram payload restricted to `module_group` (`None` or `"ALL"` for everything)
    fn fetch_diagram(&self, module_group: Option<&str>, params: &LayoutParams) -> Result<DiagramPayload>;

    /// Display modes; the first entry is the default
    fn fetch_display_modes(&self) -> Result<Vec<DisplayMode>>;

    /// Distinct module groups, sorted
    fn fetch_module_groups(&self) -> Result<Vec<String>>;
}

/// Group of `node`, defaulting to [`DEFAULT_MODULE_GROUP`]
pub fn module_group_of(node: &RawNode) -> &str {
    node.module_group
        .as_deref()
        .filter(|g| !g.trim().is_empty())
        .unwrap_or(DEFAULT_MODULE_GROUP)
}

/// Distinct module groups of `nodes`, sorted
pub fn module_groups(nodes: &[RawNode]) -> Vec<String> {
    nodes
        .iter()
        .map(module_group_of)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Prepare a full payload the way the diagram server does
///
/// Keeps the nodes of `module_group`, drops edges left without a source
/// or target, and sizes every node from `params`.
pub fn prepare_payload(payload: DiagramPayload, module_group: Option<&str>, params: &LayoutParams) -> DiagramPayload {
    let keep_all = matches!(module_group, None | Some(ALL_MODULE_GROUPS));

    let nodes: Vec<RawNode> = payload
        .nodes
        .into_iter()
        .filter(|n| keep_all || Some(module_group_of(n)) == module_group)
        .map(|mut n| {
            if n.module_group.as_deref().map_or(true, |g| g.trim().is_empty()) {
                n.module_group = Some(DEFAULT_MODULE_GROUP.to_string());
            }
            n.width = Some(params.width);
            n.height = Some(params.head_height + params.port_height * n.ports.len() as u32);
            n
        })
        .collect();

    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let edges = payload
        .edges
        .into_iter()
        .filter(|e| {
            let keep = ids.contains(e.source_node_id.as_str()) && ids.contains(e.target_node_id.as_str());
            if !keep {
                debug!(edge = e.id.as_str(), "Dropping edge outside the selected nodes");
            }
            keep
        })
        .collect();

    DiagramPayload { nodes, edges }
}

fn read_json_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| anyhow!("Failed to read '{}': {}", path.display(), e))
}

/// Data source backed by JSON files
///
/// The diagram file holds a full `{ nodes, edges }` payload; filtering by
/// module group happens on every fetch. Without a display-mode file the
/// built-in modes are served.
#[derive(Debug, Clone)]
pub struct FileDataSource {
    diagram_path: PathBuf,
    display_modes_path: Option<PathBuf>,
}

impl FileDataSource {
    pub fn new(diagram_path: impl Into<PathBuf>) -> Self {
        Self {
            diagram_path: diagram_path.into(),
            display_modes_path: None,
        }
    }

    pub fn with_display_modes(mut self, path: impl Into<PathBuf>) -> Self {
        self.display_modes_path = Some(path.into());
        self
    }

    fn read_payload(&self) -> Result<DiagramPayload> {
        let content = read_json_file(&self.diagram_path)?;
        DiagramPayload::from_json(&content)
            .map_err(|e| anyhow!("Invalid diagram file '{}': {}", self.diagram_path.display(), e))
    }
}

impl DataSource for FileDataSource {
    fn fetch_diagram(&self, module_group: Option<&str>, params: &LayoutParams) -> Result<DiagramPayload> {
        let fetch_span = span!(Level::DEBUG, "fetch_diagram", path = %self.diagram_path.display());
        let _enter = fetch_span.enter();

        let payload = self.read_payload()?;
        Ok(prepare_payload(payload, module_group, params))
    }

    fn fetch_display_modes(&self) -> Result<Vec<DisplayMode>> {
        match &self.display_modes_path {
            Some(path) => {
                let content = read_json_file(path)?;
                serde_json::from_str(&content)
                    .map_err(|e| anyhow!("Invalid display mode file '{}': {}", path.display(), e))
            }
            None => Ok(DisplayModeRegistry::builtin().modes().to_vec()),
        }
    }

    fn fetch_module_groups(&self) -> Result<Vec<String>> {
        Ok(module_groups(&self.read_payload()?.nodes))
    }
}

/// Data source serving an in-memory payload
#[derive(Debug, Clone)]
pub struct StaticDataSource {
    payload: DiagramPayload,
    modes: Vec<DisplayMode>,
}

impl StaticDataSource {
    pub fn new(payload: DiagramPayload) -> Self {
        Self {
            payload,
            modes: DisplayModeRegistry::builtin().modes().to_vec(),
        }
    }

    pub fn with_modes(mut self, modes: Vec<DisplayMode>) -> Self {
        self.modes = modes;
        self
    }
}

impl DataSource for StaticDataSource {
    fn fetch_diagram(&self, module_group: Option<&str>, params: &LayoutParams) -> Result<DiagramPayload> {
        Ok(prepare_payload(self.payload.clone(), module_group, params))
    }

    fn fetch_display_modes(&self) -> Result<Vec<DisplayMode>> {
        Ok(self.modes.clone())
    }

    fn fetch_module_groups(&self) -> Result<Vec<String>> {
        Ok(module_groups(&self.payload.nodes))
    }
}
