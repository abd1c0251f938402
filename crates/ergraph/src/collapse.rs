//! Collapse state machine
//!
//! A node is either expanded (the initial state after every load) or
//! collapsed down to its header row. Collapsing hides the node's ports and
//! outgoing edges on the surface only; the model keeps them, and expanding
//! rebuilds both from the model. Edges arriving on a port of a collapsed
//! node are attached to the node body until it expands again.

use std::collections::HashMap;
use tracing::{debug, span, Level};

use crate::core::{CollapseGlyph, Database, DiagramError};
use crate::model::Edge;
use crate::render::{EdgeView, RenderSurface, ViewContext};

/// View state of one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollapseState {
    #[default]
    Expanded,
    /// Header only; `original_height` is restored on expand
    Collapsed { original_height: u32 },
}

impl CollapseState {
    pub fn is_collapsed(&self) -> bool {
        matches!(self, CollapseState::Collapsed { .. })
    }

    pub fn glyph(&self) -> CollapseGlyph {
        match self {
            CollapseState::Expanded => CollapseGlyph::Minus,
            CollapseState::Collapsed { .. } => CollapseGlyph::Plus,
        }
    }
}

/// Collapse state of every node touched since the last load
///
/// Nodes without an entry are expanded.
#[derive(Debug, Clone, Default)]
pub struct CollapseTracker {
    states: HashMap<String, CollapseState>,
}

impl CollapseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, node_id: &str) -> CollapseState {
        self.states.get(node_id).copied().unwrap_or_default()
    }

    pub fn is_collapsed(&self, node_id: &str) -> bool {
        self.state(node_id).is_collapsed()
    }

    /// Ids of all collapsed nodes
    pub fn collapsed(&self) -> impl Iterator<Item = &str> {
        self.states
            .iter()
            .filter(|(_, s)| s.is_collapsed())
            .map(|(id, _)| id.as_str())
    }

    /// Forget every state; all nodes count as expanded again
    pub fn reset(&mut self) {
        self.states.clear();
    }

    /// Flip `node_id` between expanded and collapsed, returning the new state
    pub fn toggle<S: RenderSurface>(
        &mut self,
        node_id: &str,
        ctx: ViewContext<'_>,
        surface: &mut S,
    ) -> Result<CollapseState, DiagramError> {
        let toggle_span = span!(Level::DEBUG, "toggle_collapse", node = node_id);
        let _enter = toggle_span.enter();

        let current_height = surface
            .node(node_id)
            .map(|view| view.rect.height)
            .ok_or_else(|| DiagramError::unknown_node(node_id))?;
        let node = ctx
            .model
            .get_node(node_id)
            .ok_or_else(|| DiagramError::unknown_node(node_id))?;

        let next = match self.state(node_id) {
            CollapseState::Expanded => {
                let next = CollapseState::Collapsed {
                    original_height: current_height,
                };
                self.states.insert(node_id.to_string(), next);
                surface.set_node_height(node_id, ctx.adapter.layout().collapsed_height())?;
                surface.set_glyph(node_id, next.glyph())?;
                let removed = surface.remove_outgoing_edges(node_id);
                surface.remove_ports(node_id)?;
                let anchored: Vec<String> = surface
                    .edges()
                    .filter(|e| e.target.node_id == node_id && e.target.port_id.is_some())
                    .map(|e| e.id.clone())
                    .collect();
                for edge_id in &anchored {
                    surface.set_edge_target_port(edge_id, None);
                }
                debug!(
                    original_height = current_height,
                    removed_edges = removed,
                    detached_edges = anchored.len(),
                    "Node collapsed"
                );
                next
            }
            CollapseState::Collapsed { original_height } => {
                let next = CollapseState::Expanded;
                self.states.insert(node_id.to_string(), next);
                surface.set_node_height(node_id, original_height)?;
                surface.set_glyph(node_id, next.glyph())?;
                surface.set_ports(node_id, ctx.adapter.port_views(node, ctx.mode, ctx.width))?;
                for edge in ctx.model.incoming_edges(node_id) {
                    let port = ctx.model.resolve_port(node_id, edge.target_port_id.as_deref());
                    surface.set_edge_target_port(&edge.id, port.map(str::to_string));
                }
                let mut restored = 0;
                for edge in ctx.model.outgoing_edges(node_id) {
                    surface.add_edge(self.edge_view(edge, ctx));
                    restored += 1;
                }
                debug!(height = original_height, restored_edges = restored, "Node expanded");
                next
            }
        };

        Ok(next)
    }

    /// Edge view whose target end never sits on a port hidden by a collapse
    pub fn edge_view(&self, edge: &Edge, ctx: ViewContext<'_>) -> EdgeView {
        let mut view = ctx.adapter.edge_view(edge, ctx.model);
        if self.is_collapsed(&edge.target_node_id) {
            view.target.port_id = None;
        }
        view
    }
}
