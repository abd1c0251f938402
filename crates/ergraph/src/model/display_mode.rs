//! Display modes and the registry holding the active one
//!
//! A display mode selects which raw properties become the visible node and
//! port labels. Modes are loaded once; only the active selection changes.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::DiagramError;

/// Property keys produced by the diagram server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyName {
    Name,
    FieldType,
    Comment,
    NameComment,
    TableName,
    JavaClass,
    ColumnName,
    ColumnType,
    NotNull,
}

impl PropertyName {
    /// Key used in `properties` maps
    pub fn key(&self) -> &'static str {
        match self {
            PropertyName::Name => "name",
            PropertyName::FieldType => "fieldType",
            PropertyName::Comment => "comment",
            PropertyName::NameComment => "name_comment",
            PropertyName::TableName => "tableName",
            PropertyName::JavaClass => "javaClass",
            PropertyName::ColumnName => "columnName",
            PropertyName::ColumnType => "columnType",
            PropertyName::NotNull => "notNull",
        }
    }

    /// Human-readable name, used in tooltips
    pub fn display_name(&self) -> &'static str {
        match self {
            PropertyName::Name => "Name",
            PropertyName::FieldType => "Field Type",
            PropertyName::Comment => "Comment",
            PropertyName::NameComment => "Name and Comment",
            PropertyName::TableName => "Table Name",
            PropertyName::JavaClass => "Java Class",
            PropertyName::ColumnName => "Column Name",
            PropertyName::ColumnType => "Column Type",
            PropertyName::NotNull => "Not Null",
        }
    }
}

/// Named mapping from raw properties to node and port labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayMode {
    pub name: String,
    pub node_property_name: String,
    #[serde(default)]
    pub second_node_property_name: Option<String>,
    pub main_port_property_name: String,
    #[serde(default)]
    pub second_port_property_name: Option<String>,
}

impl DisplayMode {
    pub fn new(
        name: impl Into<String>,
        node_property_name: impl Into<String>,
        main_port_property_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            node_property_name: node_property_name.into(),
            second_node_property_name: None,
            main_port_property_name: main_port_property_name.into(),
            second_port_property_name: None,
        }
    }

    pub fn with_second_node_property(mut self, key: impl Into<String>) -> Self {
        self.second_node_property_name = Some(key.into());
        self
    }

    pub fn with_second_port_property(mut self, key: impl Into<String>) -> Self {
        self.second_port_property_name = Some(key.into());
        self
    }

    fn builtin(
        name: &str,
        node: PropertyName,
        second_node: Option<PropertyName>,
        port: PropertyName,
        second_port: PropertyName,
    ) -> Self {
        Self {
            name: name.to_string(),
            node_property_name: node.key().to_string(),
            second_node_property_name: second_node.map(|p| p.key().to_string()),
            main_port_property_name: port.key().to_string(),
            second_port_property_name: Some(second_port.key().to_string()),
        }
    }
}

/// Ordered set of display modes with one active selection
///
/// The first mode is the default.
#[derive(Debug, Clone)]
pub struct DisplayModeRegistry {
    modes: Vec<DisplayMode>,
    active: usize,
}

impl DisplayModeRegistry {
    /// Create a registry; fails when `modes` is empty
    pub fn new(modes: Vec<DisplayMode>) -> Result<Self, DiagramError> {
        if modes.is_empty() {
            return Err(DiagramError::NoDisplayModes);
        }
        Ok(Self { modes, active: 0 })
    }

    /// The modes offered by the diagram server
    pub fn builtin() -> Self {
        use PropertyName::*;

        let modes = vec![
            DisplayMode::builtin("名称-类型", Name, Some(Comment), Name, JavaClass),
            DisplayMode::builtin("名称-描述", NameComment, None, Name, Comment),
            DisplayMode::builtin("描述-名称", Comment, Some(Name), Comment, Name),
            DisplayMode::builtin("描述-类型", Comment, Some(Name), Comment, FieldType),
            DisplayMode::builtin("数据库表", TableName, Some(Comment), ColumnName, ColumnType),
        ];
        Self { modes, active: 0 }
    }

    /// Currently active mode
    pub fn active(&self) -> &DisplayMode {
        &self.modes[self.active]
    }

    pub fn get(&self, name: &str) -> Option<&DisplayMode> {
        self.modes.iter().find(|m| m.name == name)
    }

    /// Activate the mode called `name`, falling back to the default mode
    /// when no such mode exists
    pub fn select(&mut self, name: &str) -> &DisplayMode {
        match self.modes.iter().position(|m| m.name == name) {
            Some(index) => {
                debug!(mode = name, "Display mode selected");
                self.active = index;
            }
            None => {
                warn!(mode = name, "Unknown display mode, using default");
                self.active = 0;
            }
        }
        self.active()
    }

    pub fn names(&self) -> Vec<&str> {
        self.modes.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn modes(&self) -> &[DisplayMode] {
        &self.modes
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

impl Default for DisplayModeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry_rejected() {
        assert!(matches!(
            DisplayModeRegistry::new(Vec::new()),
            Err(DiagramError::NoDisplayModes)
        ));
    }

    #[test]
    fn test_first_mode_is_default() {
        let registry = DisplayModeRegistry::builtin();
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.active().name, "名称-类型");
        assert_eq!(registry.active().node_property_name, "name");
        assert_eq!(
            registry.active().second_node_property_name.as_deref(),
            Some("comment")
        );
    }

    #[test]
    fn test_select_known_mode() {
        let mut registry = DisplayModeRegistry::builtin();
        let mode = registry.select("数据库表");
        assert_eq!(mode.main_port_property_name, "columnName");
        assert_eq!(registry.active().name, "数据库表");
    }

    #[test]
    fn test_select_unknown_falls_back_to_default() {
        let mut registry = DisplayModeRegistry::builtin();
        registry.select("描述-名称");
        let mode = registry.select("missing");
        assert_eq!(mode.name, "名称-类型");
    }

    #[test]
    fn test_display_mode_json_with_null_second_property() {
        let json = r#"[{"name":"名称-描述","nodePropertyName":"name_comment","secondNodePropertyName":null,
                        "mainPortPropertyName":"name","secondPortPropertyName":"comment"}]"#;
        let modes: Vec<DisplayMode> = serde_json::from_str(json).unwrap();
        assert_eq!(modes[0].second_node_property_name, None);
        assert_eq!(modes[0].second_port_property_name.as_deref(), Some("comment"));
    }

    #[test]
    fn test_property_names() {
        assert_eq!(PropertyName::NameComment.key(), "name_comment");
        assert_eq!(PropertyName::ColumnType.display_name(), "Column Type");
    }
}
