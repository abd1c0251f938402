//! Entity nodes, attribute ports and relationship edges
//!
//! `RawNode` is the wire shape delivered by the data source; `Node` is the
//! resolved model node with a position and derived size.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::NodeShape;

/// Property name to display string
pub type Properties = BTreeMap<String, String>;

/// An attribute slot inside a node, addressable by edges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub properties: Properties,
}

impl Port {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// A relationship between two nodes, optionally anchored on ports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source_node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_port_id: Option<String>,
    pub target_node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Properties,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source_node_id: impl Into<String>,
        target_node_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_node_id: source_node_id.into(),
            source_port_id: None,
            target_node_id: target_node_id.into(),
            target_port_id: None,
            left_text: None,
            center_text: None,
            right_text: None,
            title: None,
            properties: Properties::new(),
        }
    }

    pub fn from_port(mut self, port_id: impl Into<String>) -> Self {
        self.source_port_id = Some(port_id.into());
        self
    }

    pub fn to_port(mut self, port_id: impl Into<String>) -> Self {
        self.target_port_id = Some(port_id.into());
        self
    }

    pub fn with_center_text(mut self, text: impl Into<String>) -> Self {
        self.center_text = Some(text.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Non-empty label texts in left, center, right order
    pub fn labels(&self) -> Vec<&str> {
        [&self.left_text, &self.center_text, &self.right_text]
            .into_iter()
            .filter_map(|t| t.as_deref())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Node as delivered by the data source
///
/// Position and size are optional on the wire; the model fills them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub ports: Vec<Port>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_group: Option<String>,
}

impl RawNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            properties: Properties::new(),
            ports: Vec::new(),
            x: None,
            y: None,
            width: None,
            height: None,
            module_group: None,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_port(mut self, port: Port) -> Self {
        self.ports.push(port);
        self
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.module_group = Some(group.into());
        self
    }
}

/// Full diagram payload: `{ nodes: [...], edges: [...] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramPayload {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl DiagramPayload {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Resolved entity node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub shape: NodeShape,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    /// Expanded height: header plus one row per port
    pub height: u32,
    pub title: Option<String>,
    pub properties: Properties,
    /// Ports in display order
    pub ports: Vec<Port>,
    pub module_group: Option<String>,
}

impl Node {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn port(&self, port_id: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.id == port_id)
    }

    pub fn has_port(&self, port_id: &str) -> bool {
        self.port(port_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_labels_skip_empty() {
        let mut edge = Edge::new("e1", "A", "B").with_center_text("*");
        edge.left_text = Some(String::new());
        edge.right_text = Some("1".to_string());
        assert_eq!(edge.labels(), vec!["*", "1"]);
    }

    #[test]
    fn test_edge_without_labels() {
        let edge = Edge::new("e1", "A", "B");
        assert!(edge.labels().is_empty());
    }

    #[test]
    fn test_payload_deserializes_camel_case() {
        let json = r#"{
            "nodes": [{
                "id": "Order",
                "title": "Name: Order",
                "properties": {"name": "Order"},
                "ports": [{"id": "id", "properties": {"name": "id", "javaClass": "Long"}}],
                "x": 10, "y": 20, "height": 64, "width": 220,
                "moduleGroup": "sales"
            }],
            "edges": [{
                "id": "Order.customer",
                "sourceNodeId": "Order",
                "sourcePortId": "customer",
                "targetNodeId": "Customer",
                "centerText": "0..1"
            }]
        }"#;
        let payload = DiagramPayload::from_json(json).unwrap();
        assert_eq!(payload.nodes.len(), 1);
        let node = &payload.nodes[0];
        assert_eq!(node.x, Some(10));
        assert_eq!(node.module_group.as_deref(), Some("sales"));
        assert_eq!(node.ports[0].property("javaClass"), Some("Long"));

        let edge = &payload.edges[0];
        assert_eq!(edge.source_port_id.as_deref(), Some("customer"));
        assert_eq!(edge.target_port_id, None);
        assert_eq!(edge.labels(), vec!["0..1"]);
    }

    #[test]
    fn test_payload_tolerates_missing_lists() {
        let payload = DiagramPayload::from_json("{}").unwrap();
        assert!(payload.nodes.is_empty());
        assert!(payload.edges.is_empty());
    }
}
