//! Display-mode projection
//!
//! Turns raw node and port properties into the label text shown for the
//! active display mode.

use crate::model::{DisplayMode, Node, Port};

/// Separator between the name and type halves of a port label
pub const PORT_LABEL_SEPARATOR: &str = " : ";

/// Header label for `node`
///
/// The main property, followed by a line break and the second property
/// when the mode configures one and the node has it.
pub fn node_label(node: &Node, mode: &DisplayMode) -> String {
    let mut text = node
        .property(&mode.node_property_name)
        .unwrap_or_default()
        .to_string();

    if let Some(second) = mode
        .second_node_property_name
        .as_deref()
        .and_then(|key| node.property(key))
    {
        text.push('\n');
        text.push_str(second);
    }
    text
}

/// Two halves of a port label
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortLabel {
    /// Main (name) text
    pub left: String,
    /// Secondary (type) text, possibly empty
    pub right: String,
}

impl PortLabel {
    /// `left : right`, or just `left` when the right half is empty
    pub fn display(&self) -> String {
        if self.right.is_empty() {
            self.left.clone()
        } else {
            format!("{}{}{}", self.left, PORT_LABEL_SEPARATOR, self.right)
        }
    }
}

/// Project `port` through `mode`
pub fn port_label(port: &Port, mode: &DisplayMode) -> PortLabel {
    let left = port
        .property(&mode.main_port_property_name)
        .unwrap_or_default()
        .to_string();
    let right = mode
        .second_port_property_name
        .as_deref()
        .and_then(|key| port.property(key))
        .unwrap_or_default()
        .to_string();
    PortLabel { left, right }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NodeShape;
    use crate::model::Properties;

    fn node(properties: &[(&str, &str)]) -> Node {
        Node {
            id: "N1".to_string(),
            shape: NodeShape::ErRect,
            x: 0,
            y: 0,
            width: 160,
            height: 30,
            title: None,
            properties: properties
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Properties>(),
            ports: Vec::new(),
            module_group: None,
        }
    }

    #[test]
    fn test_node_label_single_property() {
        let mode = DisplayMode::new("m", "name", "name");
        assert_eq!(node_label(&node(&[("name", "Order")]), &mode), "Order");
    }

    #[test]
    fn test_node_label_with_second_property() {
        let mode = DisplayMode::new("m", "name", "name").with_second_node_property("comment");
        let n = node(&[("name", "Order"), ("comment", "订单")]);
        assert_eq!(node_label(&n, &mode), "Order\n订单");
    }

    #[test]
    fn test_node_label_second_property_absent() {
        let mode = DisplayMode::new("m", "name", "name").with_second_node_property("comment");
        assert_eq!(node_label(&node(&[("name", "Order")]), &mode), "Order");
    }

    #[test]
    fn test_node_label_missing_main_property() {
        let mode = DisplayMode::new("m", "tableName", "name");
        assert_eq!(node_label(&node(&[("name", "Order")]), &mode), "");
    }

    #[test]
    fn test_port_label_with_type() {
        let mode = DisplayMode::new("m", "name", "name").with_second_port_property("type");
        let port = Port::new("p1")
            .with_property("name", "id")
            .with_property("type", "int");
        let label = port_label(&port, &mode);
        assert_eq!(label.left, "id");
        assert_eq!(label.right, "int");
        assert_eq!(label.display(), "id : int");
    }

    #[test]
    fn test_port_label_empty_type() {
        let mode = DisplayMode::new("m", "name", "name").with_second_port_property("columnType");
        let port = Port::new("orders")
            .with_property("name", "orders")
            .with_property("columnType", "");
        assert_eq!(port_label(&port, &mode).display(), "orders");
    }

    #[test]
    fn test_port_label_without_second_key() {
        let mode = DisplayMode::new("m", "name", "name");
        let port = Port::new("p1").with_property("name", "id");
        assert_eq!(port_label(&port, &mode).display(), "id");
    }
}
