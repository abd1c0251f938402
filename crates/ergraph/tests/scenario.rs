//! The Order entity walked through load, collapse, expand and export

use ergraph::core::{CollapseGlyph, Database, DiagramConfig};
use ergraph::model::{DiagramPayload, DisplayMode, DisplayModeRegistry, Edge, Port, RawNode};
use ergraph::render::{RenderSurface, SceneSurface};
use ergraph::session::DiagramSession;

fn order_payload() -> DiagramPayload {
    DiagramPayload {
        nodes: vec![
            RawNode::new("N1")
                .with_property("name", "Order")
                .with_port(
                    Port::new("p1")
                        .with_property("name", "id")
                        .with_property("type", "int"),
                )
                .with_port(
                    Port::new("p2")
                        .with_property("name", "total")
                        .with_property("type", "decimal"),
                )
                .at(0, 0),
            RawNode::new("N2").with_property("name", "Invoice").at(400, 0),
        ],
        edges: vec![Edge::new("e1", "N1", "N2").from_port("p2")],
    }
}

fn session() -> DiagramSession<SceneSurface> {
    let modes = vec![DisplayMode::new("name-type", "name", "name").with_second_port_property("type")];
    let mut session = DiagramSession::new(
        DiagramConfig::new(30, 24, 160),
        DisplayModeRegistry::new(modes).unwrap(),
        SceneSurface::new(),
    );
    let ticket = session.begin_load(None);
    session.finish_load(ticket, Ok(order_payload())).unwrap();
    session
}

#[test]
fn test_rendered_height() {
    let session = session();
    let n1 = session.surface().node("N1").unwrap();
    assert_eq!(n1.rect.height, 78);
    assert_eq!(n1.rect.width, 160);
    assert_eq!(n1.ports.len(), 2);
    assert_eq!(n1.ports[0].rect.y, 30);
    assert_eq!(n1.ports[1].rect.y, 54);
}

#[test]
fn test_export_cells() {
    let session = session();
    let xml = String::from_utf8(session.export_drawio().bytes).unwrap();

    assert!(xml.contains(r#"<mxCell id="N1" value="Order""#));
    assert!(xml.contains(r#"<mxGeometry x="0" y="0" width="160" height="78" as="geometry"/>"#));
    assert!(xml.contains(r#"<mxCell id="N1-p1" value="id : int""#));
    assert!(xml.contains(r#"<mxGeometry x="0" y="24" width="160" height="24" as="geometry"/>"#));
    assert!(xml.contains(r#"<mxCell id="N1-p2" value="total : decimal""#));
    assert!(xml.contains(r#"<mxGeometry x="0" y="48" width="160" height="24" as="geometry"/>"#));
}

#[test]
fn test_collapse_and_expand() {
    let mut session = session();
    session.toggle_collapse("N1").unwrap();

    let n1 = session.surface().node("N1").unwrap();
    assert_eq!(n1.rect.height, 30);
    assert!(n1.port("p1").is_none());
    assert!(n1.port("p2").is_none());
    assert_eq!(n1.glyph, CollapseGlyph::Plus);
    assert_eq!(session.surface().edges().count(), 0);

    session.toggle_collapse("N1").unwrap();
    let n1 = session.surface().node("N1").unwrap();
    assert_eq!(n1.rect.height, 78);
    let ids: Vec<&str> = n1.ports.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2"]);
    assert_eq!(n1.glyph, CollapseGlyph::Minus);
    assert_eq!(session.surface().edges().count(), 1);
}

#[test]
fn test_export_ignores_collapse() {
    let mut session = session();
    let before = session.export_drawio();
    session.toggle_collapse("N1").unwrap();
    let after = session.export_drawio();

    assert_eq!(before, after);
    assert_eq!(session.model().get_node("N1").unwrap().ports.len(), 2);
    assert_eq!(session.model().edge_count(), 1);
}

#[test]
fn test_collapsed_target_never_shows_port_anchor() {
    let mut session = session();
    let payload = DiagramPayload {
        nodes: vec![
            RawNode::new("Order")
                .with_property("name", "Order")
                .with_port(Port::new("customer").with_property("name", "customer"))
                .at(0, 0),
            RawNode::new("Customer")
                .with_property("name", "Customer")
                .with_port(Port::new("id").with_property("name", "id"))
                .at(300, 0),
        ],
        edges: vec![Edge::new("Order.customer", "Order", "Customer")
            .from_port("customer")
            .to_port("id")],
    };
    let ticket = session.begin_load(None);
    session.finish_load(ticket, Ok(payload)).unwrap();

    session.toggle_collapse("Customer").unwrap();
    let surface = session.surface();
    assert!(surface.node("Customer").unwrap().ports.is_empty());
    for edge in surface.edges().filter(|e| e.target.node_id == "Customer") {
        assert_eq!(edge.target.port_id, None);
    }

    // export still anchors on the port
    let xml = String::from_utf8(session.export_drawio().bytes).unwrap();
    assert!(xml.contains(r#"source="Order-customer" target="Customer-id""#));

    session.toggle_collapse("Customer").unwrap();
    let edge = session.surface().edge("Order.customer").unwrap();
    assert_eq!(edge.target.port_id.as_deref(), Some("id"));
}
