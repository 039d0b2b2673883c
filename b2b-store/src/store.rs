use async_trait::async_trait;

use crate::error::StoreResult;
use crate::query::{Predicate, Query, Row};

/// Row-level operations shared by a store and an open transaction.
///
/// Every row carries a string primary key in its `id` column.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Rows matching `query.filter`, ordered and windowed.
    async fn select(&self, table: &str, query: &Query) -> StoreResult<Vec<Row>>;

    /// Number of rows matching `filter`, ignoring any window.
    async fn count(&self, table: &str, filter: &[Predicate]) -> StoreResult<u64>;

    /// Insert one row and return it as stored.
    async fn insert(&self, table: &str, row: Row) -> StoreResult<Row>;

    /// Merge `patch` into every row matching `filter` and return the
    /// updated rows. The `id` column is never rewritten.
    async fn update(&self, table: &str, filter: &[Predicate], patch: Row) -> StoreResult<Vec<Row>>;

    /// Delete every row matching `filter`, returning how many went away.
    async fn delete(&self, table: &str, filter: &[Predicate]) -> StoreResult<u64>;

    /// First row matching `filter`, if any.
    async fn find_one(&self, table: &str, filter: &[Predicate]) -> StoreResult<Option<Row>> {
        let query = Query::new().filter(filter.to_vec()).limit(Some(1));
        let rows = self.select(table, &query).await?;
        Ok(rows.into_iter().next())
    }
}

/// A unit of work. Statements are applied all-or-nothing on `commit`;
/// dropping the transaction without committing rolls it back.
#[async_trait]
pub trait Transaction: Executor {
    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// The database handle injected into services.
#[async_trait]
pub trait Store: Executor {
    /// Open a transaction.
    ///
    /// While it is open, the caller must route every statement through
    /// the transaction rather than the store.
    async fn begin(&self) -> StoreResult<Box<dyn Transaction>>;
}
