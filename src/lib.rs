//! imagepromoter - derive and validate container image promotions
//!
//! A promotion makes an image digest (and its tags) available in every
//! destination registry, mirrored from a source registry. This crate turns
//! declarative manifests into the exact set of copy operations required,
//! and validates that set against safety policies before any registry is
//! touched.
//!
//! # Architecture
//!
//! - [`core`] - Domain types, manifests, edge derivation, configuration
//! - [`checks`] - Pluggable pre-promotion safety checks
//! - [`sizes`] - Artifact size lookups feeding the size check
//! - [`files`] - File manifest generation for non-image artifacts
//! - [`cli`] - Command-line interface layer
//! - [`ui`] - Output helpers
//!
//! # Correctness Invariants
//!
//! 1. The edge set is a true set, independent of manifest order or repetition
//! 2. Derivation and checks are pure: no I/O, no logging, no shared state
//! 3. Malformed manifests are rejected, never silently skipped
//! 4. Every violation is returned as a structured, comparable value

pub mod checks;
pub mod cli;
pub mod core;
pub mod files;
pub mod sizes;
pub mod ui;
