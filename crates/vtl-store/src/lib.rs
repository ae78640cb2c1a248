//! Named-entry storage for the veterinary treatment ledger.
//!
//! The ledger persists its whole chain as one value under one name, the way
//! a browser's key/value storage would hold it. This crate provides that
//! key/value surface and its backends.
//!
//! # Storage Backends
//!
//! All backends implement the [`EntryStore`] trait:
//!
//! - [`InMemoryEntryStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileEntryStore`] -- one file per entry in a directory, written atomically
//!
//! # Design Rules
//!
//! 1. The store never interprets entry contents -- values are opaque text.
//! 2. A `set` either replaces the whole value or leaves the old one intact.
//! 3. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileEntryStore;
pub use memory::InMemoryEntryStore;
pub use traits::{validate_key, EntryStore};
