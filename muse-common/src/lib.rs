//! # Muse Common Library
//!
//! Shared code for the Muse schema-conformance harness:
//! - Error taxonomy and SQLSTATE classification
//! - Entity row models with declared table/primary-key names
//! - Timestamp parsing helpers

pub mod error;
pub mod model;

pub use error::{Error, Result, ViolationKind};
