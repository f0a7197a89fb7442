//! Pipeline configuration documents.
//!
//! A pipeline document declares triggers, processors and outputs.
//! This crate parses and validates those documents, orders processors
//! by their dependencies, and exports graphs drawn in the visual editor.

pub mod editor;
pub mod emit;
pub mod graph;
pub mod plan;
pub mod schema;
pub mod settings;
pub mod validate;
