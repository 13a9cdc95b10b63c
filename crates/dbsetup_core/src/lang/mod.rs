//! dbsetup vocabulary registries.
//!
//! This module is the “front door” for the extension's vocabulary: declaration markers and configuration error kinds.
//!
//! The design goal is to avoid stringly-typed checks scattered across the derive macro and the engine. Instead,
//! callers work with **stable IDs** (e.g. `MarkerId`, `ErrorKind`) and look up spellings/metadata via registry tables.
//!
//! ## Notes
//! - Registries are intentionally **pure**: no engine types, no IO, no side effects.
//!
//! ## Examples
//! ```rust
//! use dbsetup_core::lang::markers::{self, MarkerId};
//!
//! assert_eq!(markers::from_str("operation"), Some(MarkerId::Operation));
//! assert_eq!(markers::as_str(MarkerId::Operation), "operation");
//! ```
//!
//! ## See also
//! - `cargo run -p dbsetup_core --bin generate_marker_reference` to generate the Markdown reference tables.

pub mod errors;
pub mod markers;
pub mod registry;
