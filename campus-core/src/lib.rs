//! Core shared library for the Campus admin services.
//!
//! This crate exposes the primitives the directory and issue tracker
//! services depend on: common errors, configuration loading, the
//! database pool wrapper, declarative validation and logging setup.

pub mod config;
pub mod db;
pub mod errors;
pub mod logging;
pub mod serde_utils;
pub mod validation;

pub use errors::{CampusError, Result as CoreResult};
pub use validation::{ValidationReport, ValidationRule, Validator};
