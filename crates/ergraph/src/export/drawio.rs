//! draw.io (mxGraphModel) interchange export

use std::fmt::Write as _;
use tracing::{debug, span, warn, Level};

use super::xml::XmlEscaped;
use super::ExportArtifact;
use crate::core::{Database, ExportFormat, EXPORT_ROW_HEIGHT};
use crate::model::{DiagramModel, DisplayMode, Edge, Node};
use crate::projection::{node_label, port_label};

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

const GRAPH_MODEL_OPEN: &str = r#"<mxGraphModel dx="0" dy="0" grid="1" gridSize="10" guides="1" tooltips="1" connect="1" arrows="1" fold="1" page="1" pageScale="1" pageWidth="827" pageHeight="1169">"#;

const NODE_STYLE: &str = "swimlane;fontStyle=0;align=center;verticalAlign=top;childLayout=stackLayout;horizontal=1;startSize=26;horizontalStack=0;resizeParent=1;resizeLast=0;collapsible=1;marginBottom=0;rounded=0;shadow=0;strokeWidth=1;fillColor=#dae8fc;strokeColor=#6c8ebf;";

const PORT_STYLE: &str = "text;align=left;verticalAlign=top;spacingLeft=4;spacingRight=4;overflow=hidden;rotatable=0;points=[[0,0.5],[1,0.5]];portConstraint=eastwest;rounded=0;shadow=0;html=0;";

const EDGE_STYLE: &str = "edgeStyle=orthogonalEdgeStyle;rounded=0;html=1;";

/// Id of the root container cell
pub const ROOT_CELL_ID: &str = "0";
/// Id of the single layer cell every node and edge hangs off
pub const LAYER_CELL_ID: &str = "1";

/// Cell id of `port_id` on `node_id`
pub fn port_cell_id(node_id: &str, port_id: &str) -> String {
    format!("{}-{}", node_id, port_id)
}

/// Serializes a [`DiagramModel`] to the draw.io interchange XML
///
/// The export always reads the canonical model, never the render surface:
/// every node is written with its full port list and expanded height, and
/// every model edge is written, whatever the current collapse state.
///
/// Cells are written in three passes: nodes (parent `"1"`), then ports
/// (parent = owning node), then edges (parent `"1"`). Port rows use a
/// fixed row height independent of the live diagram's row height.
///
/// Degrades instead of failing: a source or target port that does not
/// resolve makes the edge attach to the node body, and an edge whose node
/// is missing is skipped.
#[derive(Debug, Clone, Copy)]
pub struct DrawioExporter {
    row_height: u32,
}

impl Default for DrawioExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawioExporter {
    pub fn new() -> Self {
        Self {
            row_height: EXPORT_ROW_HEIGHT,
        }
    }

    pub fn with_row_height(mut self, row_height: u32) -> Self {
        self.row_height = row_height;
        self
    }

    pub fn row_height(&self) -> u32 {
        self.row_height
    }

    /// Export `model` with labels projected through `mode`
    pub fn export(&self, model: &DiagramModel, mode: &DisplayMode) -> String {
        let export_span = span!(
            Level::INFO,
            "export_drawio",
            nodes = model.node_count(),
            edges = model.edge_count(),
            mode = mode.name.as_str()
        );
        let _enter = export_span.enter();

        let mut out = String::new();
        out.push_str(XML_HEADER);
        out.push('\n');
        out.push_str(GRAPH_MODEL_OPEN);
        out.push('\n');
        out.push_str("  <root>\n");
        let _ = writeln!(out, r#"    <mxCell id="{}"/>"#, ROOT_CELL_ID);
        let _ = writeln!(
            out,
            r#"    <mxCell id="{}" parent="{}"/>"#,
            LAYER_CELL_ID, ROOT_CELL_ID
        );

        for node in model.nodes() {
            self.write_node(&mut out, node, mode);
        }

        let mut port_count = 0;
        for node in model.nodes() {
            for (index, port) in node.ports.iter().enumerate() {
                let label = port_label(port, mode).display();
                let _ = writeln!(
                    out,
                    r#"    <mxCell id="{}" value="{}" style="{}" vertex="1" parent="{}">"#,
                    XmlEscaped(&port_cell_id(&node.id, &port.id)),
                    XmlEscaped(&label),
                    PORT_STYLE,
                    XmlEscaped(&node.id)
                );
                let _ = writeln!(
                    out,
                    r#"      <mxGeometry x="0" y="{}" width="{}" height="{}" as="geometry"/>"#,
                    (index as u32 + 1) * self.row_height,
                    node.width,
                    self.row_height
                );
                out.push_str("    </mxCell>\n");
                port_count += 1;
            }
        }

        let mut edge_count = 0;
        for edge in model.edges() {
            if self.write_edge(&mut out, edge, model) {
                edge_count += 1;
            }
        }

        out.push_str("  </root>\n");
        out.push_str("</mxGraphModel>");

        debug!(ports = port_count, edges = edge_count, bytes = out.len(), "Export complete");
        out
    }

    /// Export as a downloadable artifact named `模型图.drawio`
    pub fn artifact(&self, model: &DiagramModel, mode: &DisplayMode) -> ExportArtifact {
        ExportArtifact::new(ExportFormat::Drawio, self.export(model, mode).into_bytes())
    }

    fn write_node(&self, out: &mut String, node: &Node, mode: &DisplayMode) {
        let mut label = node_label(node, mode);
        if label.is_empty() {
            label = node.title.clone().unwrap_or_default();
        }
        let _ = writeln!(
            out,
            r#"    <mxCell id="{}" value="{}" style="{}" vertex="1" parent="{}">"#,
            XmlEscaped(&node.id),
            XmlEscaped(&label),
            NODE_STYLE,
            LAYER_CELL_ID
        );
        let _ = writeln!(
            out,
            r#"      <mxGeometry x="{}" y="{}" width="{}" height="{}" as="geometry"/>"#,
            node.x, node.y, node.width, node.height
        );
        out.push_str("    </mxCell>\n");
    }

    fn write_edge(&self, out: &mut String, edge: &Edge, model: &DiagramModel) -> bool {
        let (Some(source), Some(target)) = (
            endpoint_cell_id(model, &edge.source_node_id, edge.source_port_id.as_deref()),
            endpoint_cell_id(model, &edge.target_node_id, edge.target_port_id.as_deref()),
        ) else {
            warn!(edge = edge.id.as_str(), "Skipping edge with missing node");
            return false;
        };

        let label = edge.labels().join(" ");
        let _ = writeln!(
            out,
            r#"    <mxCell id="{}" value="{}" style="{}" edge="1" parent="{}" source="{}" target="{}">"#,
            XmlEscaped(&edge.id),
            XmlEscaped(&label),
            EDGE_STYLE,
            LAYER_CELL_ID,
            XmlEscaped(&source),
            XmlEscaped(&target)
        );
        out.push_str("      <mxGeometry relative=\"1\" as=\"geometry\"/>\n");
        out.push_str("    </mxCell>\n");
        true
    }
}

/// Cell id an edge end attaches to, or `None` when the node is missing
fn endpoint_cell_id(model: &DiagramModel, node_id: &str, port_id: Option<&str>) -> Option<String> {
    if !model.has_node(node_id) {
        return None;
    }
    Some(match model.resolve_port(node_id, port_id) {
        Some(port_id) => port_cell_id(node_id, port_id),
        None => node_id.to_string(),
    })
}
