use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use b2b_core::errors::B2BError;
use b2b_core::{AroundHook, B2BApp, BeforeHook, HookContext, Next};
use serde_json::Value;

/// Logs every service call with its outcome and duration.
pub struct LogAround;

#[async_trait]
impl AroundHook for LogAround {
    async fn run(&self, ctx: &mut HookContext, next: Next<'_>) -> Result<()> {
        let started = Instant::now();
        let res = next.run(ctx).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &res {
            Ok(()) => tracing::info!(
                service = %ctx.service,
                method = ctx.method.action(),
                tenant = %ctx.request.tenant_id,
                user = %ctx.request.user_id,
                elapsed_ms,
                "call ok"
            ),
            Err(e) => tracing::warn!(
                service = %ctx.service,
                method = ctx.method.action(),
                tenant = %ctx.request.tenant_id,
                user = %ctx.request.user_id,
                elapsed_ms,
                error = %e,
                "call failed"
            ),
        }
        res
    }
}

/// Rejects calls whose caller lacks the `<service>:<action>` tag.
///
/// Disabled by `permissions.enforce = false`.
pub struct RequirePermission;

#[async_trait]
impl BeforeHook for RequirePermission {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        if !ctx.config.get_bool("permissions.enforce").unwrap_or(true) {
            return Ok(());
        }

        let tag = ctx.permission_tag();
        if ctx.request.has_permission(&tag) {
            return Ok(());
        }

        tracing::debug!(%tag, user = %ctx.request.user_id, role = %ctx.request.role, "permission denied");
        Err(B2BError::forbidden(format!("Missing permission '{tag}'"))
            .with_data(serde_json::json!({ "permission": tag }))
            .into_anyhow())
    }
}

/// Fills `field` on create payloads that omit it (or send `null`).
pub struct DefaultField {
    field: &'static str,
    value: Value,
}

impl DefaultField {
    pub fn new(field: &'static str, value: Value) -> Self {
        Self { field, value }
    }
}

#[async_trait]
impl BeforeHook for DefaultField {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        let Some(Value::Object(obj)) = ctx.data.as_mut() else {
            return Ok(());
        };
        match obj.get(self.field) {
            None | Some(Value::Null) => {
                obj.insert(self.field.to_string(), self.value.clone());
            }
            Some(_) => {}
        }
        Ok(())
    }
}

pub fn global_hooks(app: &B2BApp) {
    app.hooks(|h| {
        h.around_all(Arc::new(LogAround));
        h.before_all(Arc::new(RequirePermission));
    });
}
