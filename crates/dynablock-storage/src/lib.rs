//! Document string storage backends for Dynablock.
//!
//! The registry persists through the [`DocumentStorage`] trait. This crate
//! provides a redb file backend for durable documents and an in-memory
//! backend for tests and scratch sessions.

pub mod backends;

pub use backends::{available_backends, create_backend};
pub use dynablock_core::storage::{DocumentStorage, Result, StorageError};

#[cfg(feature = "redb")]
pub use backends::{RedbBackend, RedbBackendConfig};

#[cfg(feature = "memory")]
pub use backends::{MemoryBackend, MemoryBackendConfig};
