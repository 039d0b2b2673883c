//! # Hooks
//!
//! Every service call runs through the pipeline
//!
//! ```text
//! around → before → service call → after → (error)
//! ```
//!
//! App-wide hooks run before per-service hooks. Around hooks wrap the
//! rest of the chain and decide whether to call `next`. After hooks run
//! in reverse registration order. Error hooks see `ctx.error` and may
//! clear it to recover.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use b2b_store::Row;
use serde_json::Value;

use crate::config::ConfigSnapshot;
use crate::context::RequestContext;
use crate::service::{B2BService, ListQuery, Page, ServiceMethodKind};

/// What a service call produced, per method shape.
#[derive(Debug, Clone, PartialEq)]
pub enum HookResult {
    Page(Page),
    One(Option<Row>),
    Removed(bool),
    Value(Value),
}

/// Mutable state of one call as it moves through the pipeline.
#[derive(Debug)]
pub struct HookContext {
    pub request: RequestContext,
    pub service: String,
    pub method: ServiceMethodKind,
    pub id: Option<String>,
    pub query: ListQuery,
    /// Input payload for create, update and custom calls.
    pub data: Option<Value>,
    pub result: Option<HookResult>,
    pub error: Option<anyhow::Error>,
    pub config: ConfigSnapshot,
}

impl HookContext {
    pub fn new(
        request: RequestContext,
        service: impl Into<String>,
        method: ServiceMethodKind,
        config: ConfigSnapshot,
    ) -> Self {
        Self {
            request,
            service: service.into(),
            method,
            id: None,
            query: ListQuery::default(),
            data: None,
            result: None,
            error: None,
            config,
        }
    }

    /// `<service>:<action>` tag for this call.
    pub fn permission_tag(&self) -> String {
        format!("{}:{}", self.service, self.method.action())
    }
}

#[async_trait]
pub trait BeforeHook: Send + Sync {
    async fn run(&self, ctx: &mut HookContext) -> Result<()>;
}

#[async_trait]
pub trait AfterHook: Send + Sync {
    async fn run(&self, ctx: &mut HookContext) -> Result<()>;
}

#[async_trait]
pub trait ErrorHook: Send + Sync {
    async fn run(&self, ctx: &mut HookContext) -> Result<()>;
}

#[async_trait]
pub trait AroundHook: Send + Sync {
    async fn run(&self, ctx: &mut HookContext, next: Next<'_>) -> Result<()>;
}

/// The inner stage of the pipeline: before hooks, the call, after hooks.
pub(crate) struct Endpoint<'a> {
    pub(crate) before: &'a [Arc<dyn BeforeHook>],
    pub(crate) after: &'a [Arc<dyn AfterHook>],
    pub(crate) service: &'a Arc<dyn B2BService>,
}

impl Endpoint<'_> {
    async fn call(&self, ctx: &mut HookContext) -> Result<()> {
        for h in self.before {
            h.run(ctx).await?;
        }

        dispatch(self.service.as_ref(), ctx).await?;

        for h in self.after.iter().rev() {
            h.run(ctx).await?;
        }
        Ok(())
    }
}

/// Invoke the service method named by `ctx.method`, storing its result.
///
/// A before hook that already set `ctx.result` short-circuits the call.
async fn dispatch(svc: &dyn B2BService, ctx: &mut HookContext) -> Result<()> {
    if ctx.result.is_some() {
        return Ok(());
    }

    let id = ctx.id.clone().unwrap_or_default();
    let result = match ctx.method {
        ServiceMethodKind::List => {
            HookResult::Page(svc.list(&ctx.request, ctx.query.clone()).await?)
        }
        ServiceMethodKind::Get => HookResult::One(svc.get(&ctx.request, &id).await?),
        ServiceMethodKind::Create => {
            let data = ctx.data.take().unwrap_or(Value::Null);
            HookResult::One(Some(svc.create(&ctx.request, data).await?))
        }
        ServiceMethodKind::Update => {
            let data = ctx.data.take().unwrap_or(Value::Null);
            HookResult::One(svc.update(&ctx.request, &id, data).await?)
        }
        ServiceMethodKind::Remove => HookResult::Removed(svc.remove(&ctx.request, &id).await?),
        ServiceMethodKind::Custom(name) => {
            let data = ctx.data.take();
            HookResult::Value(
                svc.custom(&ctx.request, name, ctx.query.clone(), data)
                    .await?,
            )
        }
    };
    ctx.result = Some(result);
    Ok(())
}

/// The remainder of the chain, handed to an around hook.
pub struct Next<'a> {
    pub(crate) around: &'a [Arc<dyn AroundHook>],
    pub(crate) endpoint: &'a Endpoint<'a>,
}

impl Next<'_> {
    pub async fn run(self, ctx: &mut HookContext) -> Result<()> {
        match self.around.split_first() {
            Some((hook, rest)) => {
                let next = Next {
                    around: rest,
                    endpoint: self.endpoint,
                };
                hook.run(ctx, next).await
            }
            None => self.endpoint.call(ctx).await,
        }
    }
}

/// Hooks registered for one scope (the app or a single service).
#[derive(Default)]
pub struct ServiceHooks {
    pub around_all: Vec<Arc<dyn AroundHook>>,
    pub before_all: Vec<Arc<dyn BeforeHook>>,
    pub after_all: Vec<Arc<dyn AfterHook>>,
    pub error_all: Vec<Arc<dyn ErrorHook>>,

    pub around_by_method: HashMap<ServiceMethodKind, Vec<Arc<dyn AroundHook>>>,
    pub before_by_method: HashMap<ServiceMethodKind, Vec<Arc<dyn BeforeHook>>>,
    pub after_by_method: HashMap<ServiceMethodKind, Vec<Arc<dyn AfterHook>>>,
    pub error_by_method: HashMap<ServiceMethodKind, Vec<Arc<dyn ErrorHook>>>,
}

impl ServiceHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn around_all(&mut self, hook: Arc<dyn AroundHook>) -> &mut Self {
        self.around_all.push(hook);
        self
    }

    pub fn before_all(&mut self, hook: Arc<dyn BeforeHook>) -> &mut Self {
        self.before_all.push(hook);
        self
    }

    pub fn after_all(&mut self, hook: Arc<dyn AfterHook>) -> &mut Self {
        self.after_all.push(hook);
        self
    }

    pub fn error_all(&mut self, hook: Arc<dyn ErrorHook>) -> &mut Self {
        self.error_all.push(hook);
        self
    }

    pub fn around(&mut self, method: ServiceMethodKind, hook: Arc<dyn AroundHook>) -> &mut Self {
        self.around_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn before(&mut self, method: ServiceMethodKind, hook: Arc<dyn BeforeHook>) -> &mut Self {
        self.before_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn after(&mut self, method: ServiceMethodKind, hook: Arc<dyn AfterHook>) -> &mut Self {
        self.after_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn error(&mut self, method: ServiceMethodKind, hook: Arc<dyn ErrorHook>) -> &mut Self {
        self.error_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn before_create(&mut self, hook: Arc<dyn BeforeHook>) -> &mut Self {
        self.before(ServiceMethodKind::Create, hook)
    }

    pub fn before_update(&mut self, hook: Arc<dyn BeforeHook>) -> &mut Self {
        self.before(ServiceMethodKind::Update, hook)
    }

    pub fn before_remove(&mut self, hook: Arc<dyn BeforeHook>) -> &mut Self {
        self.before(ServiceMethodKind::Remove, hook)
    }

    pub fn after_list(&mut self, hook: Arc<dyn AfterHook>) -> &mut Self {
        self.after(ServiceMethodKind::List, hook)
    }

    pub fn after_get(&mut self, hook: Arc<dyn AfterHook>) -> &mut Self {
        self.after(ServiceMethodKind::Get, hook)
    }
}

/// `all` hooks first, then the ones registered for `method`.
pub(crate) fn collect_method_hooks<H: ?Sized>(
    all: &[Arc<H>],
    by_method: &HashMap<ServiceMethodKind, Vec<Arc<H>>>,
    method: &ServiceMethodKind,
) -> Vec<Arc<H>> {
    let mut out = all.to_vec();
    if let Some(v) = by_method.get(method) {
        out.extend(v.iter().cloned());
    }
    out
}
