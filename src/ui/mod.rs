//! ui
//!
//! User-facing output for the `cip` binary.
//!
//! # Modules
//!
//! - [`output`] - Verbosity-aware printing helpers

pub mod output;
