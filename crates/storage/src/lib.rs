//! Storage abstraction and implementations for ncwork.
//!
//! This crate provides a trait-based storage interface with an in-memory
//! implementation whose lifetime is the lifetime of the process.

#![warn(missing_docs)]

pub mod trait_;
pub mod memory_storage;

pub use trait_::{Storage, StorageError, Result};
pub use memory_storage::MemoryStorage;
