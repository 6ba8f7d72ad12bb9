//! Record store layer for autoss.
//!
//! Provides:
//! - [`DocumentStore`]: one collection of JSON documents (create, find by frame)
//! - Backends: Cosmos DB REST ([`CosmosStore`]), local RocksDB
//!   ([`RocksStore`]), in-process ([`MemoryStore`])
//! - [`RecordGateway`]: typed create/find that logs and absorbs store errors

pub mod column_families;
pub mod cosmos;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod rocks;
pub mod store;

pub use cosmos::CosmosStore;
pub use error::StoreError;
pub use gateway::RecordGateway;
pub use memory::MemoryStore;
pub use rocks::{RocksCollection, RocksStore};
pub use store::{matches_frame, DocumentStore};
