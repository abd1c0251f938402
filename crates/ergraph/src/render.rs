//! Render adapter
//!
//! [`RenderSurface`] is the contract an external rendering engine has to
//! satisfy: a retained set of node, port and edge views that can be
//! mutated in place. [`RenderAdapter`] turns model data into those views
//! and [`SceneSurface`] is an in-memory surface used headless and in tests.

use tracing::{debug, span, trace, Level};

use crate::core::{fit_label, fit_lines, CollapseGlyph, Database, DiagramError, NodeShape, Rect};
use crate::layout::{LayoutEngine, RowSplit};
use crate::model::{DiagramModel, DisplayMode, Edge, Node};
use crate::projection::{node_label, port_label};

/// Horizontal space the header label gives up for the collapse glyph
const HEADER_LABEL_INSET: f64 = 24.0;

/// A port row as drawn inside its node
#[derive(Debug, Clone, PartialEq)]
pub struct PortView {
    pub id: String,
    /// Row rectangle relative to the node's top-left corner
    pub rect: Rect,
    pub split: RowSplit,
    /// Full name text, as copied to the clipboard
    pub name_text: String,
    /// Full type text, as copied to the clipboard
    pub type_text: String,
    /// Name text clipped to its region
    pub name_display: String,
    /// Type text clipped to its region
    pub type_display: String,
    pub title: Option<String>,
}

/// A node as drawn on the surface
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
    pub id: String,
    pub shape: NodeShape,
    pub rect: Rect,
    pub label: String,
    pub label_display: String,
    pub title: Option<String>,
    pub glyph: CollapseGlyph,
    pub ports: Vec<PortView>,
}

impl NodeView {
    pub fn port(&self, port_id: &str) -> Option<&PortView> {
        self.ports.iter().find(|p| p.id == port_id)
    }
}

/// One end of an edge: a node, optionally a port on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub node_id: String,
    pub port_id: Option<String>,
}

/// An edge as drawn on the surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeView {
    pub id: String,
    pub source: Endpoint,
    pub target: Endpoint,
    pub labels: Vec<String>,
    pub title: Option<String>,
}

/// Contract for the rendering surface
///
/// Mutations address nodes by id and fail with
/// [`DiagramError::UnknownNode`] when the node is not on the surface.
pub trait RenderSurface {
    /// Remove every node and edge
    fn clear(&mut self);

    /// Add a node with its ports
    fn add_node(&mut self, node: NodeView);

    /// Look up a node view
    fn node(&self, id: &str) -> Option<&NodeView>;

    /// Iterate over node views in insertion order
    fn nodes(&self) -> impl Iterator<Item = &NodeView>;

    /// Iterate over edge views in insertion order
    fn edges(&self) -> impl Iterator<Item = &EdgeView>;

    fn set_node_width(&mut self, id: &str, width: u32) -> Result<(), DiagramError>;

    fn set_node_height(&mut self, id: &str, height: u32) -> Result<(), DiagramError>;

    fn set_node_label(&mut self, id: &str, label: String, display: String) -> Result<(), DiagramError>;

    fn set_glyph(&mut self, id: &str, glyph: CollapseGlyph) -> Result<(), DiagramError>;

    /// Replace the node's ports
    fn set_ports(&mut self, id: &str, ports: Vec<PortView>) -> Result<(), DiagramError>;

    /// Detach every port from the node
    fn remove_ports(&mut self, id: &str) -> Result<(), DiagramError>;

    /// Add an edge
    fn add_edge(&mut self, edge: EdgeView);

    /// Remove every edge leaving `node_id`, returning how many were removed
    fn remove_outgoing_edges(&mut self, node_id: &str) -> usize;

    /// Re-anchor the target end of an edge; `None` attaches it to the node
    /// body. Returns false when the edge is not on the surface.
    fn set_edge_target_port(&mut self, edge_id: &str, port_id: Option<String>) -> bool;
}

/// Builds surface views from model data
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderAdapter {
    layout: LayoutEngine,
}

impl RenderAdapter {
    pub fn new(layout: LayoutEngine) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    /// Header label and its clipped form at `width`
    pub fn node_label(&self, node: &Node, mode: &DisplayMode, width: u32) -> (String, String) {
        let label = node_label(node, mode);
        let display = fit_lines(&label, width as f64 - HEADER_LABEL_INSET);
        (label, display)
    }

    /// Port rows for every port of `node` at `width`
    pub fn port_views(&self, node: &Node, mode: &DisplayMode, width: u32) -> Vec<PortView> {
        let split = self.layout.row_split(width);
        node.ports
            .iter()
            .enumerate()
            .map(|(index, port)| {
                let offset = self.layout.port_offset(index);
                let label = port_label(port, mode);
                PortView {
                    id: port.id.clone(),
                    rect: Rect::new(
                        offset.x as i32,
                        offset.y as i32,
                        width,
                        self.layout.port_row_height(),
                    ),
                    split,
                    name_display: fit_label(&label.left, split.name_width),
                    type_display: fit_label(&label.right, split.type_width),
                    name_text: label.left,
                    type_text: label.right,
                    title: port.title.clone(),
                }
            })
            .collect()
    }

    /// Expanded node view with all ports
    pub fn node_view(&self, node: &Node, mode: &DisplayMode, width: u32) -> NodeView {
        let (label, label_display) = self.node_label(node, mode, width);
        NodeView {
            id: node.id.clone(),
            shape: node.shape,
            rect: Rect::new(node.x, node.y, width, self.layout.node_height(node.ports.len())),
            label,
            label_display,
            title: node.title.clone(),
            glyph: CollapseGlyph::Minus,
            ports: self.port_views(node, mode, width),
        }
    }

    /// Edge view; a source or target port that does not resolve on its
    /// node is dropped and the edge attaches to the node body
    pub fn edge_view(&self, edge: &Edge, model: &DiagramModel) -> EdgeView {
        let source_port = model.resolve_port(&edge.source_node_id, edge.source_port_id.as_deref());
        let target_port = model.resolve_port(&edge.target_node_id, edge.target_port_id.as_deref());
        EdgeView {
            id: edge.id.clone(),
            source: Endpoint {
                node_id: edge.source_node_id.clone(),
                port_id: source_port.map(str::to_string),
            },
            target: Endpoint {
                node_id: edge.target_node_id.clone(),
                port_id: target_port.map(str::to_string),
            },
            labels: edge.labels().into_iter().map(str::to_string).collect(),
            title: edge.title.clone(),
        }
    }

    /// Replace the surface content with every node and edge of `model`,
    /// all expanded
    pub fn draw<S: RenderSurface>(&self, model: &DiagramModel, mode: &DisplayMode, width: u32, surface: &mut S) {
        let draw_span = span!(
            Level::DEBUG,
            "draw",
            nodes = model.node_count(),
            edges = model.edge_count()
        );
        let _enter = draw_span.enter();

        surface.clear();
        for node in model.nodes() {
            trace!(node = node.id.as_str(), ports = node.ports.len(), "Drawing node");
            surface.add_node(self.node_view(node, mode, width));
        }
        for edge in model.edges() {
            surface.add_edge(self.edge_view(edge, model));
        }
        debug!("Surface drawn");
    }
}

/// Everything needed to rebuild views for one node
#[derive(Debug, Clone, Copy)]
pub struct ViewContext<'a> {
    pub model: &'a DiagramModel,
    pub mode: &'a DisplayMode,
    pub width: u32,
    pub adapter: &'a RenderAdapter,
}

/// In-memory retained scene
#[derive(Debug, Clone, Default)]
pub struct SceneSurface {
    nodes: Vec<NodeView>,
    edges: Vec<EdgeView>,
}

impl SceneSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut NodeView, DiagramError> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| DiagramError::unknown_node(id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge(&self, id: &str) -> Option<&EdgeView> {
        self.edges.iter().find(|e| e.id == id)
    }
}

impl RenderSurface for SceneSurface {
    fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    fn add_node(&mut self, node: NodeView) {
        self.nodes.push(node);
    }

    fn node(&self, id: &str) -> Option<&NodeView> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn nodes(&self) -> impl Iterator<Item = &NodeView> {
        self.nodes.iter()
    }

    fn edges(&self) -> impl Iterator<Item = &EdgeView> {
        self.edges.iter()
    }

    fn set_node_width(&mut self, id: &str, width: u32) -> Result<(), DiagramError> {
        self.node_mut(id)?.rect.width = width;
        Ok(())
    }

    fn set_node_height(&mut self, id: &str, height: u32) -> Result<(), DiagramError> {
        self.node_mut(id)?.rect.height = height;
        Ok(())
    }

    fn set_node_label(&mut self, id: &str, label: String, display: String) -> Result<(), DiagramError> {
        let node = self.node_mut(id)?;
        node.label = label;
        node.label_display = display;
        Ok(())
    }

    fn set_glyph(&mut self, id: &str, glyph: CollapseGlyph) -> Result<(), DiagramError> {
        self.node_mut(id)?.glyph = glyph;
        Ok(())
    }

    fn set_ports(&mut self, id: &str, ports: Vec<PortView>) -> Result<(), DiagramError> {
        self.node_mut(id)?.ports = ports;
        Ok(())
    }

    fn remove_ports(&mut self, id: &str) -> Result<(), DiagramError> {
        self.node_mut(id)?.ports.clear();
        Ok(())
    }

    fn add_edge(&mut self, edge: EdgeView) {
        self.edges.push(edge);
    }

    fn remove_outgoing_edges(&mut self, node_id: &str) -> usize {
        let before = self.edges.len();
        self.edges.retain(|e| e.source.node_id != node_id);
        before - self.edges.len()
    }

    fn set_edge_target_port(&mut self, edge_id: &str, port_id: Option<String>) -> bool {
        match self.edges.iter_mut().find(|e| e.id == edge_id) {
            Some(edge) => {
                edge.target.port_id = port_id;
                true
            }
            None => false,
        }
    }
}
