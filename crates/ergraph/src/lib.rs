//! ergraph - Entity-relationship diagram model, layout and export
//!
//! Entities are nodes whose attributes are stacked as port rows; relations
//! are edges, optionally anchored on ports. The crate keeps a canonical
//! model of the diagram, lays nodes and ports out, collapses nodes to their
//! header, and exports the diagram to draw.io interchange XML.
//!
//! # Quick Start
//!
//! ```rust
//! use ergraph::export_drawio;
//!
//! let json = r#"{
//!     "nodes": [{"id": "Order", "properties": {"name": "Order"},
//!                "ports": [{"id": "id", "properties": {"name": "id", "javaClass": "Long"}}]}],
//!     "edges": []
//! }"#;
//! let xml = export_drawio(json, None).unwrap();
//! assert!(xml.contains(r#"id="Order-id""#));
//! assert!(xml.contains(r#"value="id : Long""#));
//! ```
//!
//! # Interactive Sessions
//!
//! ```rust
//! use ergraph::prelude::*;
//! use ergraph::model::{DiagramPayload, Port, RawNode};
//! use ergraph::source::StaticDataSource;
//!
//! let payload = DiagramPayload {
//!     nodes: vec![RawNode::new("Order")
//!         .with_property("name", "Order")
//!         .with_port(Port::new("id").with_property("name", "id"))],
//!     edges: vec![],
//! };
//! let mut app = CommandLoop::new(
//!     StaticDataSource::new(payload),
//!     DiagramConfig::default(),
//!     SceneSurface::new(),
//! )
//! .unwrap();
//!
//! app.handle(Command::Load).unwrap();
//! app.handle(Command::ToggleCollapse("Order".into())).unwrap();
//! assert_eq!(app.session().surface().node("Order").unwrap().rect.height, 40);
//! ```

pub mod clipboard;
pub mod collapse;
pub mod core;
pub mod export;
pub mod layout;
pub mod model;
pub mod projection;
pub mod render;
pub mod session;
pub mod source;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::collapse::{CollapseState, CollapseTracker};
    pub use crate::core::{Database, DiagramConfig, DiagramError, ExportFormat, NodeShape};
    pub use crate::export::{DrawioExporter, ExportArtifact, RasterExporter};
    pub use crate::layout::LayoutEngine;
    pub use crate::model::{DiagramModel, DisplayMode, DisplayModeRegistry};
    pub use crate::render::{RenderAdapter, RenderSurface, SceneSurface};
    pub use crate::session::{Command, CommandLoop, DiagramSession, Outcome};
    pub use crate::source::{DataSource, FileDataSource, LayoutParams};
}

/// Export a diagram payload to draw.io XML in one call
///
/// Uses the default geometry and the built-in display modes. `display_mode`
/// picks a mode by name; `None` or an unknown name uses the default.
///
/// # Example
/// ```rust
/// use ergraph::export_drawio;
///
/// let xml = export_drawio(r#"{"nodes": [{"id": "A"}], "edges": []}"#, Some("数据库表")).unwrap();
/// assert!(xml.contains(r#"<mxCell id="A""#));
/// ```
pub fn export_drawio(payload_json: &str, display_mode: Option<&str>) -> Result<String, DiagramError> {
    use crate::core::DiagramConfig;
    use crate::export::DrawioExporter;
    use crate::layout::LayoutEngine;
    use crate::model::{DiagramModel, DiagramPayload, DisplayModeRegistry};

    let config = DiagramConfig::default();
    let payload = DiagramPayload::from_json(payload_json)?;
    let model = DiagramModel::from_payload(payload, &LayoutEngine::new(&config), config.node_width)
        .map_err(|e| DiagramError::load_error(e.to_string()))?;

    let mut registry = DisplayModeRegistry::builtin();
    if let Some(name) = display_mode {
        registry.select(name);
    }
    Ok(DrawioExporter::new().export(&model, registry.active()))
}
