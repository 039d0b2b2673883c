//! Multi-tenant B2B commerce admin backend.
//!
//! Every service is scoped by the caller's tenant, site, department,
//! factory and exporter, and exposed over REST by `b2b-axum`.

pub mod config;
pub mod hooks;
pub mod services;

use std::sync::Arc;

use anyhow::Result;
use b2b_axum::{axum, AxumApp};
use b2b_core::B2BApp;
use b2b_store::{MemoryStore, Store};

use crate::services::{tables, CrudSettings};

/// A store with every admin table created.
pub fn memory_store() -> Arc<dyn Store> {
    Arc::new(MemoryStore::with_tables(tables::ALL.iter().map(|t| t.name)))
}

/// Build the server from environment config on a fresh in-memory store.
pub fn build() -> Result<AxumApp> {
    let app = B2BApp::new();
    let loaded = config::load(&app);
    tracing::debug!(loaded, prefix = config::ENV_PREFIX, "config loaded from env");
    build_with(app, memory_store())
}

/// Build the server on `app` (config already set) and `store`.
pub fn build_with(app: B2BApp, store: Arc<dyn Store>) -> Result<AxumApp> {
    config::apply_defaults(&app);
    let settings = CrudSettings::from_config(&app.config_snapshot())?;

    hooks::global_hooks(&app);
    services::configure(&app, store, settings)?;

    let mut ax = axum(app);
    for name in ax.app.service_names() {
        ax = ax.mount(&name);
    }
    Ok(ax.service("/health", || async { "ok" }))
}
