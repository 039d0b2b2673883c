use std::sync::Arc;

use anyhow::Result;
use b2b_core::schema::ValidateContract;
use b2b_core::B2BApp;
use serde_json::json;

use super::sites_schema::{CreateSite, PatchSite, ERROR_MESSAGE};
use crate::hooks::DefaultField;
use crate::services::crud::ScopedCrud;

pub const SERVICE: &str = "sites";

pub fn configure(app: &B2BApp, crud: ScopedCrud) -> Result<()> {
    app.register_service(SERVICE, Arc::new(crud));

    app.service(SERVICE)?.hooks(|h| {
        h.before_create(Arc::new(ValidateContract::<CreateSite>::new(ERROR_MESSAGE)));
        h.before_create(Arc::new(DefaultField::new("status", json!("active"))));
        h.before_update(Arc::new(ValidateContract::<PatchSite>::new(ERROR_MESSAGE)));
    });
    Ok(())
}
