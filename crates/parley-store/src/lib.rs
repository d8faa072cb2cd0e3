//! # parley-store
//!
//! Client-side persistence for the Parley client: bearer token, theme and
//! notification preferences, and the offline action log.
//!
//! The document is a single JSON file written with 0o600 permissions.

#![deny(unsafe_code)]

pub mod errors;
pub mod store;
pub mod types;

pub use errors::StoreError;
pub use store::{ClientStore, FileStore, MemoryStore, store_file_path};
pub use types::{ClientDocument, Theme};
