//! b2b-store: the storage handle the B2B admin services run against.
//!
//! Services never talk to a concrete database. They receive an
//! `Arc<dyn Store>` and speak in rows (`serde_json` objects), predicates
//! and transactions. `MemoryStore` is the bundled relational backend.

pub mod error;
pub mod memory;
pub mod query;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, MemoryTx};
pub use query::{compare_values, Direction, OrderBy, Predicate, Query, Row};
pub use store::{Executor, Store, Transaction};
