//! Persistence boundary for the billing core.
//!
//! The domain stores aggregates as versioned JSON [`Record`]s through the
//! [`RecordStore`] contract, and idempotency results through
//! [`IdempotencyStore`]. In-memory implementations of both are provided.

pub mod error;
pub mod idempotency;
pub mod memory;
pub mod query;
pub mod record;
pub mod store;
pub mod version;

pub use error::{Result, StoreError};
pub use idempotency::{IdempotencyRecord, IdempotencyStore, InMemoryIdempotencyStore};
pub use memory::InMemoryRecordStore;
pub use query::RecordQuery;
pub use record::{Record, RecordBuilder};
pub use store::{RecordStore, RecordStoreExt, SaveOptions};
pub use version::Version;
