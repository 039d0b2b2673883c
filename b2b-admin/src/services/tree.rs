//! Forest assembly for self-referencing tables (`parentId`).

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use async_trait::async_trait;
use b2b_core::errors::B2BError;
use b2b_core::{
    payload_object, B2BService, ListQuery, Page, RequestContext, ServiceCapabilities,
};
use b2b_store::{compare_values, Direction, Predicate, Row};
use serde_json::{json, Value};

use crate::services::crud::ScopedCrud;

pub const PARENT_ID: &str = "parentId";
pub const CHILDREN: &str = "children";

fn id_of(row: &Row) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

fn parent_of(row: &Row) -> Option<&str> {
    row.get(PARENT_ID)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn sibling_order(a: &Row, b: &Row) -> std::cmp::Ordering {
    let null = Value::Null;
    compare_values(a.get("sort").unwrap_or(&null), b.get("sort").unwrap_or(&null))
        .then_with(|| compare_values(a.get("name").unwrap_or(&null), b.get("name").unwrap_or(&null)))
}

/// Nest `rows` under their parents, each node gaining a `children` array.
///
/// Rows whose parent is missing from `rows` become roots. Siblings are
/// ordered by `sort`, then `name`. Rows caught in a parent cycle are
/// promoted to roots instead of being dropped.
pub fn build_tree(mut rows: Vec<Row>) -> Vec<Value> {
    rows.sort_by(sibling_order);

    let ids: HashSet<String> = rows.iter().filter_map(id_of).map(str::to_string).collect();

    let mut children: HashMap<String, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        match parent_of(row) {
            Some(parent) if ids.contains(parent) && Some(parent) != id_of(row) => {
                children.entry(parent.to_string()).or_default().push(idx);
            }
            _ => roots.push(idx),
        }
    }

    let mut visited = vec![false; rows.len()];
    let mut forest: Vec<Value> = roots
        .iter()
        .map(|&idx| assemble(idx, &rows, &children, &mut visited))
        .collect();

    // anything not reached sits on a cycle
    for idx in 0..rows.len() {
        if !visited[idx] {
            forest.push(assemble(idx, &rows, &children, &mut visited));
        }
    }
    forest
}

fn assemble(
    idx: usize,
    rows: &[Row],
    children: &HashMap<String, Vec<usize>>,
    visited: &mut [bool],
) -> Value {
    visited[idx] = true;
    let mut node = rows[idx].clone();

    let kid_idxs: Vec<usize> = id_of(&rows[idx])
        .and_then(|id| children.get(id))
        .cloned()
        .unwrap_or_default();

    let mut kids = Vec::with_capacity(kid_idxs.len());
    for child in kid_idxs {
        // already claimed when the parent chain loops back
        if !visited[child] {
            kids.push(assemble(child, rows, children, visited));
        }
    }

    node.insert(CHILDREN.to_string(), Value::Array(kids));
    Value::Object(node)
}

/// Scoped CRUD over a `parentId` table plus a `tree` custom method.
#[derive(Clone)]
pub struct TreeCrud {
    crud: ScopedCrud,
    /// Refuse to remove a node that still has children.
    guard_children: bool,
}

impl TreeCrud {
    pub fn new(crud: ScopedCrud) -> Self {
        Self {
            crud,
            guard_children: false,
        }
    }

    pub fn guard_children(mut self) -> Self {
        self.guard_children = true;
        self
    }

    /// Every row in scope, nested by `parentId`.
    pub async fn tree(&self, ctx: &RequestContext) -> Result<Vec<Value>> {
        let rows = self
            .crud
            .select_in(self.crud.store().as_ref(), ctx, &[], Some(("sort", Direction::Asc)))
            .await?;
        Ok(build_tree(rows))
    }

    fn check_parent(id: &str, data: &Row) -> Result<()> {
        if data.get(PARENT_ID).and_then(Value::as_str) == Some(id) {
            return Err(B2BError::unprocessable("Invalid parent")
                .with_errors(json!({ PARENT_ID: ["a node cannot be its own parent"] }))
                .into_anyhow());
        }
        Ok(())
    }
}

#[async_trait]
impl B2BService for TreeCrud {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::standard_crud().with_custom("tree")
    }

    async fn list(&self, ctx: &RequestContext, query: ListQuery) -> Result<Page> {
        self.crud.list(ctx, query).await
    }

    async fn get(&self, ctx: &RequestContext, id: &str) -> Result<Option<Row>> {
        self.crud.get(ctx, id).await
    }

    async fn create(&self, ctx: &RequestContext, data: Value) -> Result<Row> {
        self.crud.create(ctx, payload_object(data)?).await
    }

    async fn update(&self, ctx: &RequestContext, id: &str, data: Value) -> Result<Option<Row>> {
        let data = payload_object(data)?;
        Self::check_parent(id, &data)?;
        self.crud.update(ctx, id, data).await
    }

    async fn remove(&self, ctx: &RequestContext, id: &str) -> Result<bool> {
        if self.guard_children {
            let store = self.crud.store().as_ref();
            let children = self
                .crud
                .count_in(store, ctx, &[Predicate::eq(PARENT_ID, id)])
                .await?;
            if children > 0 {
                return Err(B2BError::conflict(format!(
                    "{} {id} still has {children} child rows",
                    self.crud.table().name
                ))
                .into_anyhow());
            }
        }
        self.crud.remove(ctx, id).await
    }

    async fn custom(
        &self,
        ctx: &RequestContext,
        method: &str,
        _query: ListQuery,
        _data: Option<Value>,
    ) -> Result<Value> {
        match method {
            "tree" => Ok(Value::Array(self.tree(ctx).await?)),
            other => Err(B2BError::method_not_allowed(format!("Unknown method '{other}'")).into_anyhow()),
        }
    }
}
