use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use b2b_core::store::Row;
use b2b_core::{
    AfterHook, AroundHook, B2BApp, B2BError, B2BService, BeforeHook, ErrorHook, ErrorKind,
    HookContext, HookResult, ListQuery, Next, Page, RequestContext, ServiceCapabilities,
    ServiceMethodKind,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

/// Echo service: `get` returns the id, `create` returns the payload.
struct Echo;

#[async_trait]
impl B2BService for Echo {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::standard_crud().with_custom("ping")
    }

    async fn list(&self, ctx: &RequestContext, query: ListQuery) -> Result<Page> {
        let mut row = Row::new();
        row.insert("tenantId".into(), json!(ctx.tenant_id));
        Ok(Page {
            data: vec![row],
            total: 1,
            page: query.page,
            limit: query.limit,
        })
    }

    async fn get(&self, _ctx: &RequestContext, id: &str) -> Result<Option<Row>> {
        if id == "missing" {
            return Ok(None);
        }
        let mut row = Row::new();
        row.insert("id".into(), json!(id));
        Ok(Some(row))
    }

    async fn create(&self, _ctx: &RequestContext, data: Value) -> Result<Row> {
        b2b_core::payload_object(data)
    }

    async fn remove(&self, _ctx: &RequestContext, id: &str) -> Result<bool> {
        if id == "boom" {
            return Err(anyhow::anyhow!("storage exploded"));
        }
        Ok(true)
    }

    async fn custom(
        &self,
        _ctx: &RequestContext,
        method: &str,
        _query: ListQuery,
        data: Option<Value>,
    ) -> Result<Value> {
        Ok(json!({"method": method, "data": data}))
    }
}

/// Read-only service exposing only `list`.
struct ListOnly;

#[async_trait]
impl B2BService for ListOnly {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::from_methods(vec![ServiceMethodKind::List])
    }
}

struct Trace {
    label: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl BeforeHook for Trace {
    async fn run(&self, _ctx: &mut HookContext) -> Result<()> {
        self.log.lock().push(format!("before:{}", self.label));
        Ok(())
    }
}

#[async_trait]
impl AfterHook for Trace {
    async fn run(&self, _ctx: &mut HookContext) -> Result<()> {
        self.log.lock().push(format!("after:{}", self.label));
        Ok(())
    }
}

#[async_trait]
impl AroundHook for Trace {
    async fn run(&self, ctx: &mut HookContext, next: Next<'_>) -> Result<()> {
        self.log.lock().push(format!("around-in:{}", self.label));
        let res = next.run(ctx).await;
        self.log.lock().push(format!("around-out:{}", self.label));
        res
    }
}

struct Deny;

#[async_trait]
impl BeforeHook for Deny {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        Err(B2BError::forbidden(format!("missing {}", ctx.permission_tag())).into_anyhow())
    }
}

struct Recover;

#[async_trait]
impl ErrorHook for Recover {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        ctx.error = None;
        ctx.result = Some(HookResult::Removed(false));
        Ok(())
    }
}

fn ctx() -> RequestContext {
    RequestContext::new("T1", "u1")
}

#[tokio::test]
async fn hooks_run_in_pipeline_order() {
    let app = B2BApp::new();
    app.register_service("echo", Arc::new(Echo));

    let log = Arc::new(Mutex::new(Vec::new()));
    let hook = |label| {
        Arc::new(Trace {
            label,
            log: Arc::clone(&log),
        })
    };

    app.hooks(|h| {
        h.around_all(hook("app"));
        h.before_all(hook("app"));
        h.after_all(hook("app"));
    });
    let echo = app
        .service("echo")
        .unwrap()
        .hooks(|h| {
            h.around_all(hook("svc"));
            h.before(ServiceMethodKind::Get, hook("svc"));
            h.after_get(hook("svc"));
        });

    let row = echo.get(ctx(), "p1").await.unwrap().unwrap();
    assert_eq!(row["id"], "p1");

    assert_eq!(
        *log.lock(),
        vec![
            "around-in:app",
            "around-in:svc",
            "before:app",
            "before:svc",
            "after:svc",
            "after:app",
            "around-out:svc",
            "around-out:app",
        ]
    );
}

#[tokio::test]
async fn method_hooks_only_fire_for_their_method() {
    let app = B2BApp::new();
    app.register_service("echo", Arc::new(Echo));

    let log = Arc::new(Mutex::new(Vec::new()));
    let echo = app.service("echo").unwrap().hooks(|h| {
        h.before_create(Arc::new(Trace {
            label: "create",
            log: Arc::clone(&log),
        }));
    });

    echo.list(ctx(), ListQuery::new()).await.unwrap();
    assert!(log.lock().is_empty());

    echo.create(ctx(), json!({"name": "x"})).await.unwrap();
    assert_eq!(*log.lock(), vec!["before:create"]);
}

#[tokio::test]
async fn failing_before_hook_stops_the_call() {
    let app = B2BApp::new();
    app.register_service("echo", Arc::new(Echo));
    let echo = app.service("echo").unwrap().hooks(|h| {
        h.before_remove(Arc::new(Deny));
    });

    let err = echo.remove(ctx(), "p1").await.unwrap_err();
    let b2b = B2BError::find(&err).unwrap();
    assert_eq!(b2b.kind, ErrorKind::Forbidden);
    assert_eq!(b2b.message, "missing echo:remove");
}

#[tokio::test]
async fn error_hook_can_recover() {
    let app = B2BApp::new();
    app.register_service("echo", Arc::new(Echo));

    let echo = app.service("echo").unwrap();
    assert!(echo.remove(ctx(), "boom").await.is_err());

    let echo = echo.hooks(|h| {
        h.error(ServiceMethodKind::Remove, Arc::new(Recover));
    });
    assert!(!echo.remove(ctx(), "boom").await.unwrap());
}

#[tokio::test]
async fn capabilities_gate_methods() {
    let app = B2BApp::new();
    app.register_service("reports", Arc::new(ListOnly));
    let reports = app.service("reports").unwrap();

    let err = reports.create(ctx(), json!({})).await.unwrap_err();
    assert_eq!(B2BError::kind_of(&err), ErrorKind::MethodNotAllowed);

    // allowed but not implemented
    let err = reports.list(ctx(), ListQuery::new()).await.unwrap_err();
    assert_eq!(B2BError::kind_of(&err), ErrorKind::NotImplemented);
}

#[tokio::test]
async fn custom_methods_resolve_by_name() {
    let app = B2BApp::new();
    app.register_service("echo", Arc::new(Echo));
    let echo = app.service("echo").unwrap();

    let out = echo
        .custom(ctx(), "ping", ListQuery::new(), Some(json!({"a": 1})))
        .await
        .unwrap();
    assert_eq!(out, json!({"method": "ping", "data": {"a": 1}}));

    let err = echo
        .custom(ctx(), "pong", ListQuery::new(), None)
        .await
        .unwrap_err();
    assert_eq!(B2BError::kind_of(&err), ErrorKind::MethodNotAllowed);
}

#[tokio::test]
async fn unknown_service_is_not_found() {
    let app = B2BApp::new();
    let err = app.service("nope").err().unwrap();
    assert_eq!(B2BError::kind_of(&err), ErrorKind::NotFound);
}

#[tokio::test]
async fn hooks_see_config_snapshot() {
    struct ReadLimit;

    #[async_trait]
    impl BeforeHook for ReadLimit {
        async fn run(&self, ctx: &mut HookContext) -> Result<()> {
            if ctx.query.limit.is_none() {
                ctx.query.limit = ctx.config.get_u64("paginate.default");
            }
            Ok(())
        }
    }

    let app = B2BApp::new();
    app.set("paginate.default", "7");
    app.register_service("echo", Arc::new(Echo));
    let echo = app.service("echo").unwrap().hooks(|h| {
        h.before(ServiceMethodKind::List, Arc::new(ReadLimit));
    });

    let page = echo.list(ctx(), ListQuery::new()).await.unwrap();
    assert_eq!(page.limit, Some(7));
    assert_eq!(page.data[0]["tenantId"], "T1");
}
