//! Generic scoped CRUD over one `TableDef`.
//!
//! Every statement is constrained by the caller's scope predicates
//! (see `b2b_core::scope`). Inserts and updates additionally force the
//! caller's scope identifiers into the row, so a client can neither
//! write into another tenant nor move a row out of its own scope.
//!
//! The `*_in` methods take an explicit executor so domain services can
//! run several of them inside one transaction.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use b2b_core::errors::B2BError;
use b2b_core::table::ID;
use b2b_core::{
    build_scope, inject_scope, payload_object, B2BService, ConfigSnapshot, ListQuery, Page,
    RequestContext, Scope, ScopePolicy, TableDef,
};
use b2b_store::{Direction, Executor, Predicate, Query, Row, Store};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Scope policy and pagination bounds shared by every CRUD service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrudSettings {
    pub policy: ScopePolicy,
    /// Page size when the caller sends none; `None` returns every row.
    pub paginate_default: Option<u64>,
    /// Upper bound on any page size.
    pub paginate_max: Option<u64>,
}

impl CrudSettings {
    /// Read `scope.policy`, `paginate.default` and `paginate.max`.
    pub fn from_config(config: &ConfigSnapshot) -> Result<Self> {
        let policy = match config.get("scope.policy") {
            Some(raw) => raw
                .parse::<ScopePolicy>()
                .context("invalid scope.policy")?,
            None => ScopePolicy::default(),
        };
        Ok(Self {
            policy,
            paginate_default: read_u64(config, "paginate.default")?,
            paginate_max: read_u64(config, "paginate.max")?,
        })
    }

    /// Page size for a requested limit: the default when absent, never
    /// above the maximum.
    pub fn effective_limit(&self, requested: Option<u64>) -> Option<u64> {
        match (requested.or(self.paginate_default), self.paginate_max) {
            (Some(l), Some(max)) => Some(l.min(max)),
            (None, Some(max)) => Some(max),
            (l, None) => l,
        }
    }
}

fn read_u64(config: &ConfigSnapshot, key: &str) -> Result<Option<u64>> {
    config
        .get(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .with_context(|| format!("invalid {key}: '{raw}'"))
        })
        .transpose()
}

/// RFC 3339 UTC timestamp with fixed precision, so string order is
/// chronological order.
pub fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Candidate values for a filter sent as a query-string value: the
/// string itself plus its integer, float or boolean reading.
fn filter_candidates(value: &Value) -> Vec<Value> {
    let Value::String(raw) = value else {
        return vec![value.clone()];
    };

    let mut out = vec![value.clone()];
    if let Ok(n) = raw.parse::<i64>() {
        out.push(Value::from(n));
    } else if let Ok(f) = raw.parse::<f64>() {
        out.push(Value::from(f));
    }
    match raw.as_str() {
        "true" => out.push(Value::Bool(true)),
        "false" => out.push(Value::Bool(false)),
        "null" => out.push(Value::Null),
        _ => {}
    }
    out
}

/// CRUD over a single table, scoped by the caller's `RequestContext`.
#[derive(Clone)]
pub struct ScopedCrud {
    store: Arc<dyn Store>,
    table: TableDef,
    settings: CrudSettings,
}

impl ScopedCrud {
    pub fn new(store: Arc<dyn Store>, table: TableDef, settings: CrudSettings) -> Self {
        Self {
            store,
            table,
            settings,
        }
    }

    pub fn table(&self) -> &TableDef {
        &self.table
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn settings(&self) -> &CrudSettings {
        &self.settings
    }

    /// Another table on the same store with the same settings.
    pub fn sibling(&self, table: TableDef) -> ScopedCrud {
        ScopedCrud::new(Arc::clone(&self.store), table, self.settings)
    }

    pub fn scope(&self, ctx: &RequestContext) -> Scope {
        let scope = build_scope(self.table.scope, self.table.absent_ok, ctx, self.settings.policy);
        if let Scope::DenyAll { axis } = &scope {
            tracing::debug!(
                table = self.table.name,
                axis = %axis,
                tenant = %ctx.tenant_id,
                "scope unresolved, denying all rows"
            );
        }
        scope
    }

    /// Scope predicates ANDed with `extra`, or `None` when the caller may
    /// see nothing.
    fn scoped_filter(&self, ctx: &RequestContext, extra: &[Predicate]) -> Option<Vec<Predicate>> {
        match self.scope(ctx) {
            Scope::DenyAll { .. } => None,
            Scope::Filter(mut filter) => {
                filter.extend_from_slice(extra);
                Some(filter)
            }
        }
    }

    /// Search and equality filters requested by a list query.
    ///
    /// Filters naming scope columns or undeclared columns are ignored.
    pub fn query_predicates(&self, query: &ListQuery) -> Vec<Predicate> {
        let mut out = Vec::new();

        if let (Some(column), Some(needle)) = (self.table.search_column, &query.search) {
            out.push(Predicate::contains(column, needle.clone()));
        }

        for (column, value) in &query.filters {
            if !self.table.has_column(column) || self.table.is_scope_column(column) {
                continue;
            }
            let mut candidates = filter_candidates(value);
            if candidates.len() == 1 {
                out.push(Predicate::Eq {
                    column: column.clone(),
                    value: candidates.remove(0),
                });
            } else {
                out.push(Predicate::is_in(column.clone(), candidates));
            }
        }
        out
    }

    /// Keep only declared, writable columns of a client payload.
    fn writable(&self, data: Row) -> Row {
        data.into_iter()
            .filter(|(k, _)| {
                k != ID && self.table.has_column(k) && !self.table.is_timestamp_column(k)
            })
            .collect()
    }

    fn default_order(&self, query: Query) -> Query {
        match self.table.created_at() {
            Some(column) => query.order_by(column, Direction::Desc),
            None => query.order_by(ID, Direction::Asc),
        }
    }

    pub async fn list(&self, ctx: &RequestContext, query: ListQuery) -> Result<Page> {
        self.list_in(self.store.as_ref(), ctx, query, &[]).await
    }

    /// One page of rows matching scope, `query` and `extra`.
    pub async fn list_in<E>(
        &self,
        exec: &E,
        ctx: &RequestContext,
        query: ListQuery,
        extra: &[Predicate],
    ) -> Result<Page>
    where
        E: Executor + ?Sized,
    {
        let page = query.page.max(1);
        let limit = self.settings.effective_limit(query.limit);

        let Some(mut filter) = self.scoped_filter(ctx, extra) else {
            return Ok(Page {
                data: Vec::new(),
                total: 0,
                page,
                limit,
            });
        };
        filter.extend(self.query_predicates(&query));

        let total = exec.count(self.table.name, &filter).await?;

        let offset = match limit {
            Some(l) => (page - 1).saturating_mul(l),
            // an unbounded first page holds every row
            None if page > 1 => u64::MAX,
            None => 0,
        };
        let select = self.default_order(Query::new().filter(filter).limit(limit).offset(offset));
        let data = exec.select(self.table.name, &select).await?;

        Ok(Page {
            data,
            total,
            page,
            limit,
        })
    }

    /// Every row matching scope and `extra`, in `order` (or the default
    /// order).
    pub async fn select_in<E>(
        &self,
        exec: &E,
        ctx: &RequestContext,
        extra: &[Predicate],
        order: Option<(&str, Direction)>,
    ) -> Result<Vec<Row>>
    where
        E: Executor + ?Sized,
    {
        let Some(filter) = self.scoped_filter(ctx, extra) else {
            return Ok(Vec::new());
        };
        let query = Query::new().filter(filter);
        let query = match order {
            Some((column, direction)) => query.order_by(column, direction),
            None => self.default_order(query),
        };
        Ok(exec.select(self.table.name, &query).await?)
    }

    pub async fn count_in<E>(&self, exec: &E, ctx: &RequestContext, extra: &[Predicate]) -> Result<u64>
    where
        E: Executor + ?Sized,
    {
        match self.scoped_filter(ctx, extra) {
            Some(filter) => Ok(exec.count(self.table.name, &filter).await?),
            None => Ok(0),
        }
    }

    pub async fn get(&self, ctx: &RequestContext, id: &str) -> Result<Option<Row>> {
        self.get_in(self.store.as_ref(), ctx, id, &[]).await
    }

    pub async fn get_in<E>(
        &self,
        exec: &E,
        ctx: &RequestContext,
        id: &str,
        extra: &[Predicate],
    ) -> Result<Option<Row>>
    where
        E: Executor + ?Sized,
    {
        let Some(mut filter) = self.scoped_filter(ctx, extra) else {
            return Ok(None);
        };
        filter.push(Predicate::eq(ID, id));
        Ok(exec.find_one(self.table.name, &filter).await?)
    }

    pub async fn create(&self, ctx: &RequestContext, data: Row) -> Result<Row> {
        self.create_in(self.store.as_ref(), ctx, data).await
    }

    /// Insert a row built from `data`.
    ///
    /// Undeclared keys are dropped, the id is always server generated,
    /// scope columns are forced to the caller's values and timestamps
    /// are stamped.
    pub async fn create_in<E>(&self, exec: &E, ctx: &RequestContext, data: Row) -> Result<Row>
    where
        E: Executor + ?Sized,
    {
        if let Scope::DenyAll { axis } = self.scope(ctx) {
            return Err(B2BError::forbidden(format!(
                "Cannot create {} rows without {axis} in the request context",
                self.table.name
            ))
            .into_anyhow());
        }

        let mut row = self.writable(data);
        inject_scope(self.table.scope, ctx, &mut row);

        let id = Uuid::new_v4().to_string();
        row.insert(ID.to_string(), Value::String(id.clone()));
        if let (Some(created), Some(updated)) = (self.table.created_at(), self.table.updated_at()) {
            let now = now_ts();
            row.insert(created.to_string(), Value::String(now.clone()));
            row.insert(updated.to_string(), Value::String(now));
        }

        let row = exec.insert(self.table.name, row).await?;
        tracing::debug!(table = self.table.name, %id, tenant = %ctx.tenant_id, "row created");
        Ok(row)
    }

    pub async fn update(&self, ctx: &RequestContext, id: &str, data: Row) -> Result<Option<Row>> {
        self.update_in(self.store.as_ref(), ctx, id, data, &[]).await
    }

    /// Merge `data` into the row `id` if it is visible; `None` otherwise.
    pub async fn update_in<E>(
        &self,
        exec: &E,
        ctx: &RequestContext,
        id: &str,
        data: Row,
        extra: &[Predicate],
    ) -> Result<Option<Row>>
    where
        E: Executor + ?Sized,
    {
        let mut extra = extra.to_vec();
        extra.push(Predicate::eq(ID, id));
        let rows = self.update_all_in(exec, ctx, &extra, data).await?;
        if rows.is_empty() {
            tracing::debug!(table = self.table.name, %id, "update matched no visible row");
        }
        Ok(rows.into_iter().next())
    }

    /// Merge `data` into every visible row matching `extra`.
    pub async fn update_all_in<E>(
        &self,
        exec: &E,
        ctx: &RequestContext,
        extra: &[Predicate],
        data: Row,
    ) -> Result<Vec<Row>>
    where
        E: Executor + ?Sized,
    {
        let Some(filter) = self.scoped_filter(ctx, extra) else {
            return Ok(Vec::new());
        };

        let mut patch = self.writable(data);
        inject_scope(self.table.scope, ctx, &mut patch);
        if let Some(updated) = self.table.updated_at() {
            patch.insert(updated.to_string(), Value::String(now_ts()));
        }

        Ok(exec.update(self.table.name, &filter, patch).await?)
    }

    pub async fn remove(&self, ctx: &RequestContext, id: &str) -> Result<bool> {
        self.remove_in(self.store.as_ref(), ctx, id, &[]).await
    }

    /// Delete the row `id` if it is visible.
    ///
    /// Always reports success; a row outside the caller's scope is simply
    /// left alone.
    pub async fn remove_in<E>(
        &self,
        exec: &E,
        ctx: &RequestContext,
        id: &str,
        extra: &[Predicate],
    ) -> Result<bool>
    where
        E: Executor + ?Sized,
    {
        let mut extra = extra.to_vec();
        extra.push(Predicate::eq(ID, id));
        let removed = self.delete_in(exec, ctx, &extra).await?;
        tracing::debug!(table = self.table.name, %id, removed, "remove");
        Ok(true)
    }

    /// Delete every visible row matching `extra`, returning the count.
    pub async fn delete_in<E>(&self, exec: &E, ctx: &RequestContext, extra: &[Predicate]) -> Result<u64>
    where
        E: Executor + ?Sized,
    {
        match self.scoped_filter(ctx, extra) {
            Some(filter) => Ok(exec.delete(self.table.name, &filter).await?),
            None => Ok(0),
        }
    }
}

#[async_trait]
impl B2BService for ScopedCrud {
    async fn list(&self, ctx: &RequestContext, query: ListQuery) -> Result<Page> {
        ScopedCrud::list(self, ctx, query).await
    }

    async fn get(&self, ctx: &RequestContext, id: &str) -> Result<Option<Row>> {
        ScopedCrud::get(self, ctx, id).await
    }

    async fn create(&self, ctx: &RequestContext, data: Value) -> Result<Row> {
        ScopedCrud::create(self, ctx, payload_object(data)?).await
    }

    async fn update(&self, ctx: &RequestContext, id: &str, data: Value) -> Result<Option<Row>> {
        ScopedCrud::update(self, ctx, id, payload_object(data)?).await
    }

    async fn remove(&self, ctx: &RequestContext, id: &str) -> Result<bool> {
        ScopedCrud::remove(self, ctx, id).await
    }
}

/// Read a string id out of a row.
pub fn row_id(row: &Row) -> Option<&str> {
    row.get(ID).and_then(Value::as_str)
}

/// Take an optional array field out of a payload.
///
/// `Ok(None)` when the key is absent or null, `BadRequest` when it is
/// not an array.
pub fn take_array(row: &mut Row, key: &str) -> Result<Option<Vec<Value>>> {
    match row.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(_) => Err(B2BError::bad_request(format!("{key} must be an array")).into_anyhow()),
    }
}

/// Take an optional array of string ids out of a payload.
pub fn take_ids(row: &mut Row, key: &str) -> Result<Option<Vec<String>>> {
    let Some(items) = take_array(row, key)? else {
        return Ok(None);
    };
    items
        .into_iter()
        .map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Ok(s),
            _ => Err(B2BError::bad_request(format!("{key} must contain string ids")).into_anyhow()),
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}
