#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`ClassifierError`)
//! - [`detect`]: Format probes (`classify`, `Classification`)
//! - [`primary`]: Primary component extraction (`extract_primary`)
//! - [`processor`]: Per-record classify + persist (`Processor`)
//! - [`pretty`]: Pretty-print for verbose output (`pretty_print`)

pub mod detect;
pub mod error;
pub mod pretty;
pub mod primary;
pub mod processor;

// --- Public API Re-exports ---

pub use detect::{Classification, classify, is_sbom};
pub use error::ClassifierError;
pub use pretty::pretty_print;
pub use primary::extract_primary;
pub use processor::{OUTPUT_SUFFIX, Processor, output_path, write_bytes};
