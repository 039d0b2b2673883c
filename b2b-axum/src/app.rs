use std::sync::Arc;

use axum::handler::Handler;
use axum::http::HeaderName;
use axum::routing::get;
use axum::Router;
use b2b_core::{B2BApp, B2BService};
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::rest;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A `B2BApp` plus the axum router its services are mounted on.
#[derive(Clone)]
pub struct AxumApp {
    pub app: B2BApp,
    pub router: Router<()>,
}

impl AxumApp {
    pub fn new(app: B2BApp) -> Self {
        Self {
            app,
            router: Router::new(),
        }
    }

    pub fn use_router(mut self, path: &str, router: Router<()>) -> Self {
        self.router = self.router.nest(path, router);
        self
    }

    /// Mount a plain GET handler, e.g. `/health`.
    pub fn service<H, T>(mut self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        self.router = self.router.route(path, get(handler));
        self
    }

    /// Register `service` under `path` (without the leading slash) and
    /// mount its REST routes.
    pub fn use_service(self, path: &str, service: Arc<dyn B2BService>) -> Self {
        let name = path.trim_start_matches('/');
        self.app.register_service(name, service);
        self.mount(name)
    }

    /// Mount REST routes for a service already registered on the app.
    pub fn mount(self, name: &str) -> Self {
        let router = rest::service_router(name, self.app.clone());
        self.use_router(&format!("/{name}"), router)
    }

    /// The router with request tracing and `x-request-id` handling.
    ///
    /// A request id sent by the client is kept; otherwise a UUID is
    /// generated. Either way it is echoed on the response.
    pub fn into_router(self) -> Router<()> {
        let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
        self.router
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "listening");
        axum::serve(listener, self.into_router()).await?;
        Ok(())
    }
}

pub fn axum(app: B2BApp) -> AxumApp {
    AxumApp::new(app)
}
