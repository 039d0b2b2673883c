use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use b2b_store::Row;
use parking_lot::RwLock;
use serde_json::Value;

use crate::config::{AppConfig, ConfigSnapshot};
use crate::context::RequestContext;
use crate::errors::B2BError;
use crate::hooks::{
    collect_method_hooks, AfterHook, AroundHook, BeforeHook, Endpoint, ErrorHook, HookContext,
    HookResult, Next, ServiceHooks,
};
use crate::registry::ServiceRegistry;
use crate::service::{B2BService, ListQuery, Page, ServiceCapabilities, ServiceMethodKind};

struct B2BAppInner {
    registry: RwLock<ServiceRegistry>,
    global_hooks: RwLock<ServiceHooks>,
    service_hooks: RwLock<HashMap<String, ServiceHooks>>,
    config: RwLock<AppConfig>,
}

/// Central application container: named services, hooks and config.
///
/// Cloning is cheap and shares the same state.
#[derive(Clone)]
pub struct B2BApp {
    inner: Arc<B2BAppInner>,
}

struct HooksForMethod {
    around: Vec<Arc<dyn AroundHook>>,
    before: Vec<Arc<dyn BeforeHook>>,
    after: Vec<Arc<dyn AfterHook>>,
    error: Vec<Arc<dyn ErrorHook>>,
}

impl Default for B2BApp {
    fn default() -> Self {
        Self::new()
    }
}

impl B2BApp {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(B2BAppInner {
                registry: RwLock::new(ServiceRegistry::new()),
                global_hooks: RwLock::new(ServiceHooks::new()),
                service_hooks: RwLock::new(HashMap::new()),
                config: RwLock::new(AppConfig::new()),
            }),
        }
    }

    pub fn register_service<S>(&self, name: S, service: Arc<dyn B2BService>)
    where
        S: Into<String>,
    {
        let name = name.into();
        tracing::debug!(service = %name, "service registered");
        self.inner.registry.write().register(name, service);
    }

    /// App-wide hooks, run before every service's own hooks.
    pub fn hooks<F>(&self, f: F)
    where
        F: FnOnce(&mut ServiceHooks),
    {
        let mut g = self.inner.global_hooks.write();
        f(&mut g);
    }

    fn configure_service_hooks<F>(&self, service_name: &str, f: F)
    where
        F: FnOnce(&mut ServiceHooks),
    {
        let mut map = self.inner.service_hooks.write();
        let hooks = map.entry(service_name.to_string()).or_default();
        f(hooks);
    }

    /// Handle for calling `name` through the hook pipeline.
    pub fn service(&self, name: &str) -> Result<ServiceHandle> {
        let svc = self
            .inner
            .registry
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| B2BError::not_found(format!("Service not found: {name}")).into_anyhow())?;

        Ok(ServiceHandle {
            app: self.clone(),
            name: name.to_string(),
            service: svc,
        })
    }

    pub fn service_names(&self) -> Vec<String> {
        self.inner.registry.read().names()
    }

    pub fn set<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.config.write().set(key, value);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.config.read().get(key).map(str::to_string)
    }

    /// Apply `PREFIX`-style environment overrides to the config.
    pub fn load_env(&self, prefix: &str) -> usize {
        self.inner.config.write().load_env(prefix)
    }

    pub fn config_snapshot(&self) -> ConfigSnapshot {
        self.inner.config.read().snapshot()
    }
}

/// A registered service bound to its app.
pub struct ServiceHandle {
    app: B2BApp,
    name: String,
    service: Arc<dyn B2BService>,
}

impl ServiceHandle {
    pub fn hooks<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut ServiceHooks),
    {
        self.app.configure_service_hooks(&self.name, f);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> ServiceCapabilities {
        self.service.capabilities()
    }

    /// App hooks first, then this service's, for one method.
    fn collect_hooks_for_method(&self, method: &ServiceMethodKind) -> HooksForMethod {
        let g = self.app.inner.global_hooks.read();
        let map = self.app.inner.service_hooks.read();

        let mut hooks = HooksForMethod {
            around: collect_method_hooks(&g.around_all, &g.around_by_method, method),
            before: collect_method_hooks(&g.before_all, &g.before_by_method, method),
            after: collect_method_hooks(&g.after_all, &g.after_by_method, method),
            error: collect_method_hooks(&g.error_all, &g.error_by_method, method),
        };

        if let Some(h) = map.get(&self.name) {
            hooks
                .around
                .extend(collect_method_hooks(&h.around_all, &h.around_by_method, method));
            hooks
                .before
                .extend(collect_method_hooks(&h.before_all, &h.before_by_method, method));
            hooks
                .after
                .extend(collect_method_hooks(&h.after_all, &h.after_by_method, method));
            hooks
                .error
                .extend(collect_method_hooks(&h.error_all, &h.error_by_method, method));
        }

        hooks
    }

    fn context(&self, request: RequestContext, method: ServiceMethodKind) -> Result<HookContext> {
        if !self.service.capabilities().allows(&method) {
            return Err(B2BError::method_not_allowed(format!(
                "Method '{}' is not allowed on service '{}'",
                method.action(),
                self.name
            ))
            .into_anyhow());
        }
        Ok(HookContext::new(
            request,
            self.name.clone(),
            method,
            self.app.config_snapshot(),
        ))
    }

    /// around → before → service call → after → error
    async fn run_pipeline(&self, mut ctx: HookContext) -> Result<HookContext> {
        let hooks = self.collect_hooks_for_method(&ctx.method);

        let endpoint = Endpoint {
            before: &hooks.before,
            after: &hooks.after,
            service: &self.service,
        };
        let next = Next {
            around: &hooks.around,
            endpoint: &endpoint,
        };

        if let Err(e) = next.run(&mut ctx).await {
            ctx.error = Some(e);

            for h in &hooks.error {
                if let Err(hook_err) = h.run(&mut ctx).await {
                    tracing::warn!(service = %self.name, error = %hook_err, "error hook failed");
                }
            }

            if let Some(err) = ctx.error.take() {
                return Err(err);
            }
        }

        Ok(ctx)
    }

    pub async fn list(&self, request: RequestContext, query: ListQuery) -> Result<Page> {
        let mut ctx = self.context(request, ServiceMethodKind::List)?;
        ctx.query = query;

        match self.run_pipeline(ctx).await?.result {
            Some(HookResult::Page(page)) => Ok(page),
            other => Err(unexpected("list", other)),
        }
    }

    pub async fn get(&self, request: RequestContext, id: &str) -> Result<Option<Row>> {
        let mut ctx = self.context(request, ServiceMethodKind::Get)?;
        ctx.id = Some(id.to_string());

        match self.run_pipeline(ctx).await?.result {
            Some(HookResult::One(row)) => Ok(row),
            other => Err(unexpected("get", other)),
        }
    }

    pub async fn create(&self, request: RequestContext, data: Value) -> Result<Row> {
        let mut ctx = self.context(request, ServiceMethodKind::Create)?;
        ctx.data = Some(data);

        match self.run_pipeline(ctx).await?.result {
            Some(HookResult::One(Some(row))) => Ok(row),
            other => Err(unexpected("create", other)),
        }
    }

    pub async fn update(&self, request: RequestContext, id: &str, data: Value) -> Result<Option<Row>> {
        let mut ctx = self.context(request, ServiceMethodKind::Update)?;
        ctx.id = Some(id.to_string());
        ctx.data = Some(data);

        match self.run_pipeline(ctx).await?.result {
            Some(HookResult::One(row)) => Ok(row),
            other => Err(unexpected("update", other)),
        }
    }

    pub async fn remove(&self, request: RequestContext, id: &str) -> Result<bool> {
        let mut ctx = self.context(request, ServiceMethodKind::Remove)?;
        ctx.id = Some(id.to_string());

        match self.run_pipeline(ctx).await?.result {
            Some(HookResult::Removed(ok)) => Ok(ok),
            other => Err(unexpected("remove", other)),
        }
    }

    /// Call a custom method declared in the service's capabilities.
    pub async fn custom(
        &self,
        request: RequestContext,
        method: &str,
        query: ListQuery,
        data: Option<Value>,
    ) -> Result<Value> {
        let kind = self.service.capabilities().custom(method).ok_or_else(|| {
            B2BError::method_not_allowed(format!(
                "Method '{method}' is not allowed on service '{}'",
                self.name
            ))
            .into_anyhow()
        })?;

        let mut ctx = self.context(request, kind)?;
        ctx.query = query;
        ctx.data = data;

        match self.run_pipeline(ctx).await?.result {
            Some(HookResult::Value(v)) => Ok(v),
            other => Err(unexpected(method, other)),
        }
    }
}

fn unexpected(method: &str, result: Option<HookResult>) -> anyhow::Error {
    let got = match result {
        None => "no result",
        Some(HookResult::Page(_)) => "a page",
        Some(HookResult::One(_)) => "a single row",
        Some(HookResult::Removed(_)) => "a removal flag",
        Some(HookResult::Value(_)) => "a raw value",
    };
    B2BError::general_error(format!("{method}() produced {got} unexpectedly")).into_anyhow()
}
