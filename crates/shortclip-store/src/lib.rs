//! SQLite-backed request store.
//!
//! Owns the `conversion_requests` table: schema migration, inserts with
//! server-generated ids and timestamps, point lookups, filtered listings
//! and partial patch updates. The store is passed into handlers as an
//! explicit dependency, so tests can run against an isolated in-memory
//! database.

pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::{NewConversionRequest, RequestFilter, RequestPatch, RequestStore};
