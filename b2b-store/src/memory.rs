use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::error::{StoreError, StoreResult};
use crate::query::{compare_rows, matches_all, Predicate, Query, Row};
use crate::store::{Executor, Store, Transaction};

// table name -> rows in insertion order
type Tables = HashMap<String, Vec<Row>>;

/// In-memory relational backend.
///
/// Tables must be created before use; statements against an unknown
/// table fail the way a missing relation would in a SQL database.
/// Cloning shares the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tables = names
            .into_iter()
            .map(|name| (name.into(), Vec::new()))
            .collect();
        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }
}

fn rows<'a>(tables: &'a Tables, table: &str) -> StoreResult<&'a Vec<Row>> {
    tables
        .get(table)
        .ok_or_else(|| StoreError::unknown_table(table))
}

fn rows_mut<'a>(tables: &'a mut Tables, table: &str) -> StoreResult<&'a mut Vec<Row>> {
    tables
        .get_mut(table)
        .ok_or_else(|| StoreError::unknown_table(table))
}

fn select_rows(tables: &Tables, table: &str, query: &Query) -> StoreResult<Vec<Row>> {
    let mut out: Vec<Row> = rows(tables, table)?
        .iter()
        .filter(|row| matches_all(&query.filter, row))
        .cloned()
        .collect();

    if !query.order.is_empty() {
        out.sort_by(|a, b| compare_rows(&query.order, a, b));
    }

    let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
    let limit = query
        .limit
        .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
        .unwrap_or(usize::MAX);

    Ok(out.into_iter().skip(offset).take(limit).collect())
}

fn count_rows(tables: &Tables, table: &str, filter: &[Predicate]) -> StoreResult<u64> {
    let n = rows(tables, table)?
        .iter()
        .filter(|row| matches_all(filter, row))
        .count();
    Ok(n as u64)
}

fn insert_row(tables: &mut Tables, table: &str, row: Row) -> StoreResult<Row> {
    let id = match row.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        _ => return Err(StoreError::missing_key(table)),
    };

    let rows = rows_mut(tables, table)?;
    if rows
        .iter()
        .any(|r| r.get("id").and_then(Value::as_str) == Some(id.as_str()))
    {
        return Err(StoreError::constraint(
            table,
            format!("duplicate primary key {id}"),
        ));
    }

    rows.push(row.clone());
    tracing::trace!(table, %id, "row inserted");
    Ok(row)
}

fn update_rows(
    tables: &mut Tables,
    table: &str,
    filter: &[Predicate],
    patch: Row,
) -> StoreResult<Vec<Row>> {
    let mut updated = Vec::new();
    for row in rows_mut(tables, table)?.iter_mut() {
        if !matches_all(filter, row) {
            continue;
        }
        for (k, v) in &patch {
            if k == "id" {
                continue;
            }
            row.insert(k.clone(), v.clone());
        }
        updated.push(row.clone());
    }
    tracing::trace!(table, rows = updated.len(), "rows updated");
    Ok(updated)
}

fn delete_rows(tables: &mut Tables, table: &str, filter: &[Predicate]) -> StoreResult<u64> {
    let rows = rows_mut(tables, table)?;
    let before = rows.len();
    rows.retain(|row| !matches_all(filter, row));
    let removed = (before - rows.len()) as u64;
    tracing::trace!(table, rows = removed, "rows deleted");
    Ok(removed)
}

#[async_trait]
impl Executor for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> StoreResult<Vec<Row>> {
        let tables = self.tables.read().await;
        select_rows(&tables, table, query)
    }

    async fn count(&self, table: &str, filter: &[Predicate]) -> StoreResult<u64> {
        let tables = self.tables.read().await;
        count_rows(&tables, table, filter)
    }

    async fn insert(&self, table: &str, row: Row) -> StoreResult<Row> {
        let mut tables = self.tables.write().await;
        insert_row(&mut tables, table, row)
    }

    async fn update(&self, table: &str, filter: &[Predicate], patch: Row) -> StoreResult<Vec<Row>> {
        let mut tables = self.tables.write().await;
        update_rows(&mut tables, table, filter, patch)
    }

    async fn delete(&self, table: &str, filter: &[Predicate]) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        delete_rows(&mut tables, table, filter)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn Transaction>> {
        let guard = Arc::clone(&self.tables).write_owned().await;
        let working = guard.clone();
        tracing::trace!("transaction opened");
        Ok(Box::new(MemoryTx {
            guard,
            working: Mutex::new(working),
        }))
    }
}

/// An open `MemoryStore` transaction.
///
/// Holds the store's write lock for its whole lifetime and works on a
/// private copy of the tables, which replaces the originals on commit.
pub struct MemoryTx {
    guard: OwnedRwLockWriteGuard<Tables>,
    working: Mutex<Tables>,
}

#[async_trait]
impl Executor for MemoryTx {
    async fn select(&self, table: &str, query: &Query) -> StoreResult<Vec<Row>> {
        select_rows(&self.working.lock(), table, query)
    }

    async fn count(&self, table: &str, filter: &[Predicate]) -> StoreResult<u64> {
        count_rows(&self.working.lock(), table, filter)
    }

    async fn insert(&self, table: &str, row: Row) -> StoreResult<Row> {
        insert_row(&mut self.working.lock(), table, row)
    }

    async fn update(&self, table: &str, filter: &[Predicate], patch: Row) -> StoreResult<Vec<Row>> {
        update_rows(&mut self.working.lock(), table, filter, patch)
    }

    async fn delete(&self, table: &str, filter: &[Predicate]) -> StoreResult<u64> {
        delete_rows(&mut self.working.lock(), table, filter)
    }
}

#[async_trait]
impl Transaction for MemoryTx {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working.into_inner();
        tracing::trace!("transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        tracing::trace!("transaction rolled back");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Direction;
    use serde_json::json;

    fn row(v: Value) -> Row {
        v.as_object().cloned().unwrap()
    }

    fn test_store() -> MemoryStore {
        MemoryStore::with_tables(["products", "skus"])
    }

    #[tokio::test]
    async fn test_insert_select_count() {
        let store = test_store();
        store
            .insert("products", row(json!({"id": "p1", "tenantId": "T1", "name": "Widget"})))
            .await
            .unwrap();
        store
            .insert("products", row(json!({"id": "p2", "tenantId": "T2", "name": "Gadget"})))
            .await
            .unwrap();

        let filter = vec![Predicate::eq("tenantId", "T1")];
        let rows = store
            .select("products", &Query::new().filter(filter.clone()))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Widget");
        assert_eq!(store.count("products", &filter).await.unwrap(), 1);
        assert_eq!(store.count("products", &[]).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unknown_table_and_missing_key() {
        let store = test_store();
        let err = store
            .insert("nope", row(json!({"id": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownTable { .. }));

        let err = store
            .insert("products", row(json!({"name": "no id"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingKey { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_key_is_constraint_violation() {
        let store = test_store();
        store.insert("products", row(json!({"id": "p1"}))).await.unwrap();
        let err = store
            .insert("products", row(json!({"id": "p1"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint { .. }));
    }

    #[tokio::test]
    async fn test_select_orders_and_windows() {
        let store = test_store();
        for i in 0..5 {
            store
                .insert("products", row(json!({"id": format!("p{i}"), "sort": i})))
                .await
                .unwrap();
        }

        let q = Query::new()
            .order_by("sort", Direction::Desc)
            .offset(1)
            .limit(Some(2));
        let rows = store.select("products", &q).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["p3", "p2"]);
    }

    #[tokio::test]
    async fn test_update_never_rewrites_id() {
        let store = test_store();
        store
            .insert("products", row(json!({"id": "p1", "name": "old"})))
            .await
            .unwrap();

        let updated = store
            .update(
                "products",
                &[Predicate::eq("id", "p1")],
                row(json!({"id": "hijack", "name": "new"})),
            )
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["id"], "p1");
        assert_eq!(updated[0]["name"], "new");
    }

    #[tokio::test]
    async fn test_transaction_commit_applies_all_statements() {
        let store = test_store();
        let tx = store.begin().await.unwrap();
        tx.insert("products", row(json!({"id": "p1"}))).await.unwrap();
        tx.insert("skus", row(json!({"id": "s1", "productId": "p1"}))).await.unwrap();
        assert_eq!(tx.count("skus", &[]).await.unwrap(), 1);
        tx.commit().await.unwrap();

        assert_eq!(store.count("products", &[]).await.unwrap(), 1);
        assert_eq!(store.count("skus", &[]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let store = test_store();
        store.insert("products", row(json!({"id": "p1"}))).await.unwrap();

        {
            let tx = store.begin().await.unwrap();
            tx.delete("products", &[]).await.unwrap();
            tx.insert("skus", row(json!({"id": "s1"}))).await.unwrap();
            // dropped here without commit
        }

        assert_eq!(store.count("products", &[]).await.unwrap(), 1);
        assert_eq!(store.count("skus", &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_statement_leaves_store_untouched_after_rollback() {
        let store = test_store();
        let tx = store.begin().await.unwrap();
        tx.insert("products", row(json!({"id": "p1"}))).await.unwrap();
        let err = tx.insert("products", row(json!({"id": "p1"}))).await;
        assert!(err.is_err());
        tx.rollback().await.unwrap();

        assert_eq!(store.count("products", &[]).await.unwrap(), 0);
    }
}
