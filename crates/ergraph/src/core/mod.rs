//! Core abstractions shared by every diagram component
//!
//! Errors, configuration, logging, geometry types and the storage trait.

pub mod config;
mod database;
mod error;
pub mod logging;
mod text;
mod types;

pub use config::*;
pub use database::*;
pub use error::*;
pub use logging::*;
pub use text::*;
pub use types::*;
