#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`AdapterError`)
//! - [`iterator`]: Lazy single-pass record stream (`SbomIterator`, `RecordSource`)
//! - [`pool`]: Bounded worker pool for parallel processing mode
//! - [`record`]: Candidate bytes to `SbomRecord` conversion
//! - [`flags`]: Adapter flag registration and validation
//! - [`adapter`]: Closed adapter set (`Adapter`, `AdapterSettings`)
//! - [`folder`]: Folder scan / watch input and folder output
//! - [`s3`]: Object store input and output (`ObjectStoreClient`)
//! - [`reporter`]: Dry-run / report output (`DryRunReporter`)
//! - [`engine`]: Transfer driver (`transfer`)

pub mod adapter;
pub mod engine;
pub mod error;
pub mod flags;
pub mod folder;
pub mod iterator;
pub mod pool;
pub mod record;
pub mod reporter;
pub mod s3;

// --- Public API Re-exports ---

pub use adapter::{Adapter, AdapterSettings, UploadSummary};
pub use engine::{TransferOptions, TransferSummary, transfer};
pub use error::AdapterError;
pub use flags::{AdapterKind, register_all};
pub use folder::{FolderAdapter, FolderConfig};
pub use iterator::{RecordSource, SbomIterator};
pub use reporter::{DryRunReporter, DryRunSummary};
pub use s3::{S3Adapter, S3Config};
