use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use b2b_store::Row;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::RequestContext;
use crate::errors::B2BError;

/// Service methods reachable through the app.
///
/// Custom methods are declared via `Custom("methodName")`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceMethodKind {
    List,
    Get,
    Create,
    Update,
    Remove,
    Custom(&'static str),
}

impl ServiceMethodKind {
    /// Action half of a `<service>:<action>` permission tag.
    pub fn action(&self) -> &'static str {
        match self {
            ServiceMethodKind::List => "list",
            ServiceMethodKind::Get => "get",
            ServiceMethodKind::Create => "create",
            ServiceMethodKind::Update => "update",
            ServiceMethodKind::Remove => "remove",
            ServiceMethodKind::Custom(name) => *name,
        }
    }
}

/// Which methods a service exposes to transports.
///
/// Adapters mount only the routes listed here.
#[derive(Debug, Clone)]
pub struct ServiceCapabilities {
    pub allowed_methods: Vec<ServiceMethodKind>,
}

impl ServiceCapabilities {
    pub fn standard_crud() -> Self {
        use ServiceMethodKind::*;
        Self {
            allowed_methods: vec![List, Get, Create, Update, Remove],
        }
    }

    pub fn from_methods(methods: Vec<ServiceMethodKind>) -> Self {
        Self {
            allowed_methods: methods,
        }
    }

    pub fn with_custom(mut self, name: &'static str) -> Self {
        self.allowed_methods.push(ServiceMethodKind::Custom(name));
        self
    }

    pub fn allows(&self, method: &ServiceMethodKind) -> bool {
        self.allowed_methods.contains(method)
    }

    /// Resolve a custom method by name.
    pub fn custom(&self, name: &str) -> Option<ServiceMethodKind> {
        self.allowed_methods
            .iter()
            .copied()
            .find(|m| matches!(m, ServiceMethodKind::Custom(n) if *n == name))
    }
}

/// Parameters of a `list` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    /// 1-based page number, never below 1.
    pub page: u64,
    /// Page size; `None` lets the service apply its default.
    pub limit: Option<u64>,
    pub search: Option<String>,
    /// Remaining keys, matched as equality filters on declared columns.
    pub filters: BTreeMap<String, Value>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: None,
            search: None,
            filters: BTreeMap::new(),
        }
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn filter(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(column.into(), value.into());
        self
    }

    /// Build from raw query-string pairs.
    ///
    /// `page` and `limit` must be integers (`BadRequest` otherwise); a
    /// page below 1 is clamped to 1. Blank values are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut q = ListQuery::default();
        for (k, v) in pairs {
            let (key, raw): (String, String) = (k.into(), v.into());
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            match key.as_str() {
                "page" => {
                    let page: i64 = trimmed.parse().map_err(|_| {
                        B2BError::bad_request(format!("page must be an integer, got '{trimmed}'"))
                            .into_anyhow()
                    })?;
                    q.page = u64::try_from(page.max(1)).unwrap_or(1);
                }
                "limit" => {
                    let limit: u64 = trimmed.parse().map_err(|_| {
                        B2BError::bad_request(format!(
                            "limit must be a non-negative integer, got '{trimmed}'"
                        ))
                        .into_anyhow()
                    })?;
                    q.limit = Some(limit);
                }
                "search" => q.search = Some(trimmed.to_string()),
                other => {
                    q.filters
                        .insert(other.to_string(), Value::String(trimmed.to_string()));
                }
            }
        }
        Ok(q)
    }
}

/// One page of a `list` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub data: Vec<Row>,
    pub total: u64,
    pub page: u64,
    /// `None` when the page is unbounded.
    pub limit: Option<u64>,
}

/// Take the JSON object out of a create/update payload.
pub fn payload_object(data: Value) -> Result<Row> {
    match data {
        Value::Object(map) => Ok(map),
        other => Err(B2BError::bad_request(format!(
            "payload must be a JSON object, got {}",
            json_type(&other)
        ))
        .into_anyhow()),
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A named admin service.
///
/// Every method receives the caller's `RequestContext`. Methods a
/// service does not override answer `NotImplemented`.
#[async_trait]
pub trait B2BService: Send + Sync {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::standard_crud()
    }

    async fn list(&self, _ctx: &RequestContext, _query: ListQuery) -> Result<Page> {
        Err(B2BError::not_implemented("Method not implemented: list").into_anyhow())
    }

    /// A row visible in the caller's scope, or `None`.
    async fn get(&self, _ctx: &RequestContext, _id: &str) -> Result<Option<Row>> {
        Err(B2BError::not_implemented("Method not implemented: get").into_anyhow())
    }

    async fn create(&self, _ctx: &RequestContext, _data: Value) -> Result<Row> {
        Err(B2BError::not_implemented("Method not implemented: create").into_anyhow())
    }

    /// Partial update; `None` when `id` is not visible in scope.
    async fn update(&self, _ctx: &RequestContext, _id: &str, _data: Value) -> Result<Option<Row>> {
        Err(B2BError::not_implemented("Method not implemented: update").into_anyhow())
    }

    /// Success indicator; does not tell "deleted" from "not visible".
    async fn remove(&self, _ctx: &RequestContext, _id: &str) -> Result<bool> {
        Err(B2BError::not_implemented("Method not implemented: remove").into_anyhow())
    }

    async fn custom(
        &self,
        _ctx: &RequestContext,
        method: &str,
        _query: ListQuery,
        _data: Option<Value>,
    ) -> Result<Value> {
        Err(B2BError::not_implemented(format!("Method not implemented: {method}")).into_anyhow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use serde_json::json;

    #[test]
    fn from_pairs_splits_reserved_keys() {
        let q = ListQuery::from_pairs(vec![
            ("page", "3"),
            ("limit", "20"),
            ("search", " widget "),
            ("status", "active"),
            ("categoryId", ""),
        ])
        .unwrap();
        assert_eq!(q.page, 3);
        assert_eq!(q.limit, Some(20));
        assert_eq!(q.search.as_deref(), Some("widget"));
        assert_eq!(q.filters.len(), 1);
        assert_eq!(q.filters["status"], json!("active"));
    }

    #[test]
    fn page_below_one_is_clamped() {
        assert_eq!(ListQuery::from_pairs(vec![("page", "0")]).unwrap().page, 1);
        assert_eq!(ListQuery::from_pairs(vec![("page", "-4")]).unwrap().page, 1);
        assert_eq!(ListQuery::new().page(0).page, 1);
    }

    #[test]
    fn non_numeric_paging_is_bad_request() {
        let err = ListQuery::from_pairs(vec![("limit", "ten")]).unwrap_err();
        assert_eq!(B2BError::kind_of(&err), ErrorKind::BadRequest);
    }

    #[test]
    fn capabilities_resolve_custom_methods() {
        let caps = ServiceCapabilities::standard_crud().with_custom("tree");
        assert_eq!(caps.custom("tree"), Some(ServiceMethodKind::Custom("tree")));
        assert_eq!(caps.custom("assign"), None);
        assert!(caps.allows(&ServiceMethodKind::Remove));
    }

    #[test]
    fn payload_must_be_object() {
        assert!(payload_object(json!({"name": "x"})).is_ok());
        let err = payload_object(json!([1, 2])).unwrap_err();
        assert_eq!(B2BError::kind_of(&err), ErrorKind::BadRequest);
    }
}
