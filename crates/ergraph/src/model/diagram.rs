//! Canonical diagram model
//!
//! Holds every node, port and edge of the loaded diagram independent of
//! any rendering engine. Collapse and other view state never touch it; a
//! reload replaces it wholesale.

use anyhow::{bail, Result};
use std::collections::{HashMap, HashSet};
use tracing::{debug, span, trace, warn, Level};

use super::entity::{DiagramPayload, Edge, Node, RawNode};
use crate::core::{Database, NodeShape};
use crate::export::port_cell_id;
use crate::layout::{GridPlacement, LayoutEngine};

/// Diagram model
///
/// Nodes keep payload order, which is also their export order.
#[derive(Debug, Clone, Default)]
pub struct DiagramModel {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    edge_ids: HashSet<String>,
}

impl DiagramModel {
    /// Create a new empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from a fetched payload
    ///
    /// Every node gets the diagram-wide `width` and an expanded height
    /// derived from its port count. Nodes without a position are placed on
    /// a grid below the positioned ones. Edges whose source or target node
    /// is missing are dropped.
    pub fn from_payload(payload: DiagramPayload, layout: &LayoutEngine, width: u32) -> Result<Self> {
        let build_span = span!(
            Level::DEBUG,
            "build_model",
            nodes = payload.nodes.len(),
            edges = payload.edges.len()
        );
        let _enter = build_span.enter();

        let mut model = Self::new();
        let mut unplaced = Vec::new();

        for raw in payload.nodes {
            let placed = raw.x.is_some() && raw.y.is_some();
            let node = Self::resolve_node(raw, layout, width)?;
            if !placed {
                unplaced.push(model.nodes.len());
            }
            model.add_node(node)?;
        }

        model.check_cell_ids()?;

        if !unplaced.is_empty() {
            model.place_nodes(&unplaced);
        }

        for edge in payload.edges {
            if !model.has_node(&edge.source_node_id) || !model.has_node(&edge.target_node_id) {
                debug!(
                    edge = edge.id.as_str(),
                    source = edge.source_node_id.as_str(),
                    target = edge.target_node_id.as_str(),
                    "Dropping edge with missing endpoint"
                );
                continue;
            }
            model.add_edge(edge)?;
        }

        debug!(
            node_count = model.node_count(),
            edge_count = model.edge_count(),
            "Model built"
        );
        Ok(model)
    }

    fn resolve_node(raw: RawNode, layout: &LayoutEngine, width: u32) -> Result<Node> {
        let mut seen = HashSet::new();
        for port in &raw.ports {
            if !seen.insert(port.id.as_str()) {
                bail!("Duplicate port id '{}' on node '{}'", port.id, raw.id);
            }
        }

        let height = layout.node_height(raw.ports.len());
        if let Some(wire_height) = raw.height {
            if wire_height != height {
                trace!(
                    node = raw.id.as_str(),
                    wire_height,
                    height,
                    "Payload height differs from derived height"
                );
            }
        }

        Ok(Node {
            id: raw.id,
            shape: NodeShape::ErRect,
            x: raw.x.unwrap_or(0),
            y: raw.y.unwrap_or(0),
            width,
            height,
            title: raw.title,
            properties: raw.properties,
            ports: raw.ports,
            module_group: raw.module_group,
        })
    }

    /// Port cells are exported as `{node}-{port}`; those ids must not
    /// collide with each other or with a node id.
    fn check_cell_ids(&self) -> Result<()> {
        let mut cells: HashSet<String> = self.index.keys().cloned().collect();
        for node in &self.nodes {
            for port in &node.ports {
                let cell = port_cell_id(&node.id, &port.id);
                if cells.contains(&cell) {
                    bail!(
                        "Port '{}' on node '{}' maps to cell id '{}', which is already in use",
                        port.id,
                        node.id,
                        cell
                    );
                }
                cells.insert(cell);
            }
        }
        Ok(())
    }

    fn place_nodes(&mut self, unplaced: &[usize]) {
        let origin_y = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| !unplaced.contains(i))
            .map(|(_, n)| n.y + n.height as i32 + 50)
            .max()
            .unwrap_or(0);

        let sizes: Vec<(u32, u32)> = unplaced
            .iter()
            .map(|&i| (self.nodes[i].width, self.nodes[i].height))
            .collect();
        let positions = GridPlacement::default().place(&sizes, origin_y);

        for (&i, (x, y)) in unplaced.iter().zip(positions) {
            let node = &mut self.nodes[i];
            node.x = x;
            node.y = y;
            trace!(node = node.id.as_str(), x, y, "Placed node on grid");
        }
    }

    /// Check if a node exists
    pub fn has_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Edges leaving `node_id`, in model order
    pub fn outgoing_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source_node_id == node_id)
    }

    /// Edges arriving at `node_id`, in model order
    pub fn incoming_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target_node_id == node_id)
    }

    /// Apply a new diagram-wide width to every node
    ///
    /// Properties, ports and heights are untouched.
    pub fn set_width(&mut self, width: u32) {
        for node in &mut self.nodes {
            node.width = width;
        }
    }

    /// Resolve an optional port reference on `node_id`
    ///
    /// Returns the port id when both the node and the port exist. A port
    /// reference that does not resolve is reported and treated as absent.
    pub fn resolve_port<'a>(&self, node_id: &str, port_id: Option<&'a str>) -> Option<&'a str> {
        let port_id = port_id?;
        match self.get_node(node_id) {
            Some(node) if node.has_port(port_id) => Some(port_id),
            _ => {
                warn!(node = node_id, port = port_id, "Port reference does not resolve");
                None
            }
        }
    }
}

impl Database for DiagramModel {
    type Node = Node;
    type Edge = Edge;

    fn add_node(&mut self, node: Self::Node) -> Result<()> {
        if self.index.contains_key(&node.id) {
            bail!("Duplicate node id '{}'", node.id);
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    fn add_edge(&mut self, edge: Self::Edge) -> Result<()> {
        if !self.edge_ids.insert(edge.id.clone()) {
            bail!("Duplicate edge id '{}'", edge.id);
        }
        self.edges.push(edge);
        Ok(())
    }

    fn get_node(&self, id: &str) -> Option<&Self::Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    fn nodes(&self) -> impl Iterator<Item = &Self::Node> {
        self.nodes.iter()
    }

    fn edges(&self) -> impl Iterator<Item = &Self::Edge> {
        self.edges.iter()
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.edges.clear();
        self.edge_ids.clear();
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
