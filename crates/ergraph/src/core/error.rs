//! Core error types for diagram processing
//!
//! This module defines the error taxonomy shared by loading, layout,
//! collapse handling and export.

use thiserror::Error;

use super::config::{MAX_NODE_WIDTH, MIN_NODE_WIDTH};

/// Core error types for diagram processing
#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("Load error: {message}")]
    Load { message: String },

    #[error("Invalid width '{input}': enter a number between {} and {}", MIN_NODE_WIDTH, MAX_NODE_WIDTH)]
    InvalidWidth { input: String },

    #[error("Unknown node: {id}")]
    UnknownNode { id: String },

    #[error("A diagram load is in flight; the command was rejected")]
    LoadInFlight,

    #[error("No display modes available")]
    NoDisplayModes,

    #[error("Export unavailable for format {format}")]
    ExportUnavailable { format: String },

    #[error("Clipboard error: {message}")]
    Clipboard { message: String },

    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl DiagramError {
    /// Create a new load error
    pub fn load_error(message: impl Into<String>) -> Self {
        Self::Load {
            message: message.into(),
        }
    }

    /// Create a new invalid width error from the rejected input
    pub fn invalid_width(input: impl Into<String>) -> Self {
        Self::InvalidWidth {
            input: input.into(),
        }
    }

    /// Create a new unknown node error
    pub fn unknown_node(id: impl Into<String>) -> Self {
        Self::UnknownNode { id: id.into() }
    }

    /// Create a new clipboard error
    pub fn clipboard_error(message: impl Into<String>) -> Self {
        Self::Clipboard {
            message: message.into(),
        }
    }
}
