use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;
use b2b_core::errors::B2BError;
use b2b_core::schema::validate;
use b2b_core::table::ID;
use b2b_core::{
    payload_object, B2BService, ListQuery, Page, RequestContext, ServiceCapabilities,
};
use b2b_store::{Predicate, Row, Store, Transaction};
use serde_json::{json, Value};

use super::user_site_roles_schema::{AssignRoles, ERROR_MESSAGE};
use crate::services::crud::{row_id, ScopedCrud};

pub const ASSIGN: &str = "assign";
const USER_ID: &str = "userId";

/// Which roles a user holds on which sites.
#[derive(Clone)]
pub struct UserSiteRolesService {
    assignments: ScopedCrud,
    roles: ScopedCrud,
}

impl UserSiteRolesService {
    pub fn new(assignments: ScopedCrud, roles: ScopedCrud) -> Self {
        Self { assignments, roles }
    }

    fn store(&self) -> &dyn Store {
        self.assignments.store().as_ref()
    }

    /// Replace every assignment of `request.user_id` visible to the
    /// caller with `request.assignments`.
    ///
    /// Each role must exist in the caller's scope. A caller bound to a
    /// site can only assign on that site.
    pub async fn assign(&self, ctx: &RequestContext, request: AssignRoles) -> Result<Value> {
        let role_ids: BTreeSet<&str> = request
            .assignments
            .iter()
            .map(|a| a.role_id.as_str())
            .collect();

        let tx = self.store().begin().await?;

        let found = self
            .roles
            .select_in(
                tx.as_ref(),
                ctx,
                &[Predicate::is_in(ID, role_ids.iter().copied())],
                None,
            )
            .await?;
        let missing: Vec<String> = role_ids
            .iter()
            .filter(|id| !found.iter().any(|r| row_id(r) == Some(**id)))
            .map(|id| format!("role {id} does not exist"))
            .collect();
        if !missing.is_empty() {
            return Err(B2BError::unprocessable(ERROR_MESSAGE)
                .with_errors(json!({ "assignments": missing }))
                .into_anyhow());
        }

        let removed = self
            .assignments
            .delete_in(tx.as_ref(), ctx, &[Predicate::eq(USER_ID, request.user_id.as_str())])
            .await?;

        let mut rows = Vec::with_capacity(request.assignments.len());
        for a in &request.assignments {
            let mut row = Row::new();
            row.insert(USER_ID.to_string(), json!(request.user_id));
            row.insert("roleId".to_string(), json!(a.role_id));
            if let Some(site) = &a.site_id {
                row.insert("siteId".to_string(), json!(site));
            }
            rows.push(self.assignments.create_in(tx.as_ref(), ctx, row).await?);
        }
        tx.commit().await?;

        tracing::info!(
            user = %request.user_id,
            removed,
            assigned = rows.len(),
            tenant = %ctx.tenant_id,
            "site roles assigned"
        );
        Ok(json!({ "userId": request.user_id, "assignments": rows }))
    }
}

#[async_trait]
impl B2BService for UserSiteRolesService {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::standard_crud().with_custom(ASSIGN)
    }

    async fn list(&self, ctx: &RequestContext, query: ListQuery) -> Result<Page> {
        self.assignments.list(ctx, query).await
    }

    async fn get(&self, ctx: &RequestContext, id: &str) -> Result<Option<Row>> {
        self.assignments.get(ctx, id).await
    }

    async fn create(&self, ctx: &RequestContext, data: Value) -> Result<Row> {
        self.assignments.create(ctx, payload_object(data)?).await
    }

    async fn update(&self, ctx: &RequestContext, id: &str, data: Value) -> Result<Option<Row>> {
        self.assignments.update(ctx, id, payload_object(data)?).await
    }

    async fn remove(&self, ctx: &RequestContext, id: &str) -> Result<bool> {
        self.assignments.remove(ctx, id).await
    }

    async fn custom(
        &self,
        ctx: &RequestContext,
        method: &str,
        _query: ListQuery,
        data: Option<Value>,
    ) -> Result<Value> {
        match method {
            ASSIGN => {
                let data = data.unwrap_or(Value::Null);
                let request = validate::<AssignRoles>(&data, ERROR_MESSAGE)?;
                self.assign(ctx, request).await
            }
            other => Err(B2BError::method_not_allowed(format!("Unknown method '{other}'")).into_anyhow()),
        }
    }
}
