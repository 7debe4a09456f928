//! core
//!
//! Domain types, manifests, edge derivation, and configuration.
//!
//! # Modules
//!
//! - [`types`] - Strong types: RegistryName, ImageName, Digest, Tag
//! - [`manifest`] - Promotion manifest model and loading
//! - [`edges`] - Promotion edge derivation
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Derivation is pure and deterministic

pub mod config;
pub mod edges;
pub mod manifest;
pub mod types;
