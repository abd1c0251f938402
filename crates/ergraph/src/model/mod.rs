//! Diagram model
//!
//! Entity nodes with attribute ports, relationship edges, and the display
//! modes that choose which properties become labels.

mod diagram;
mod display_mode;
mod entity;

pub use diagram::*;
pub use display_mode::*;
pub use entity::*;
