#![deny(missing_docs)]

//! # kvd
//! `kvd` packages an in-memory key value store, the HTTP service exposing it
//! and a client speaking to that service.

pub use config::ServerConfig;
pub use error::{KvStoreError, Result};
pub use metrics::Metrics;
pub use network::{Record, Status};
pub use server::Server;
pub use store::KvStore;

#[macro_use]
extern crate failure_derive;

/// Errors thrown by KvStore.
pub mod error;

/// Types needed for client server network communication.
pub mod network;

/// Server settings.
pub mod config;

/// HTTP service exposing a KvsEngine.
pub mod server;

/// HTTP client of the service.
pub mod client;

mod metrics;
mod store;

/// KvsEngine represents the storage interface used by Server.
///
/// Each call is atomic: bulk calls either apply to every key or fail leaving
/// the engine untouched.
pub trait KvsEngine: Clone + Send + Sync + 'static {
    /// Set the value for the given key.
    fn set(&self, key: String, value: String) -> Result<()>;
    /// Get the value of the given key.
    fn get(&self, key: &str) -> Result<String>;
    /// Remove the given key, returning the value it held.
    fn remove(&self, key: &str) -> Result<String>;
    /// Set the values of all given records.
    fn bulk_set(&self, records: Vec<Record>) -> Result<()>;
    /// Get the records of all given keys, in the order requested.
    fn bulk_get(&self, keys: &[String]) -> Result<Vec<Record>>;
    /// Remove all given keys.
    fn bulk_remove(&self, keys: &[String]) -> Result<()>;
    /// Snapshot of the usage counters.
    fn metrics(&self) -> Result<Metrics>;
}
