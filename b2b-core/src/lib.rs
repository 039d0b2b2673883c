//! b2b-core: request context, row scoping, services and the hook pipeline
//! shared by every admin service.

pub mod app;
pub mod config;
pub mod context;
pub mod errors;
pub mod hooks;
pub mod registry;
pub mod schema;
pub mod scope;
pub mod service;
pub mod table;

pub use app::{B2BApp, ServiceHandle};
pub use config::{AppConfig, ConfigSnapshot};
pub use context::RequestContext;
pub use errors::{B2BError, ErrorKind};
pub use hooks::{
    AfterHook, AroundHook, BeforeHook, ErrorHook, HookContext, HookResult, Next, ServiceHooks,
};
pub use registry::ServiceRegistry;
pub use scope::{build_scope, inject_scope, scope_predicates, Scope, ScopeAxes, ScopeAxis, ScopePolicy};
pub use service::{
    payload_object, B2BService, ListQuery, Page, ServiceCapabilities, ServiceMethodKind,
};
pub use table::TableDef;

pub use b2b_store as store;
