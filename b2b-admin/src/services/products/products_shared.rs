use std::sync::Arc;

use anyhow::Result;
use b2b_core::schema::ValidateContract;
use b2b_core::B2BApp;
use serde_json::json;

use super::products_schema::{CreateProduct, PatchProduct, ERROR_MESSAGE};
use super::ProductsService;
use crate::hooks::DefaultField;

pub const SERVICE: &str = "products";

pub fn configure(app: &B2BApp, service: ProductsService) -> Result<()> {
    app.register_service(SERVICE, Arc::new(service));

    app.service(SERVICE)?.hooks(|h| {
        h.before_create(Arc::new(ValidateContract::<CreateProduct>::new(ERROR_MESSAGE)));
        h.before_create(Arc::new(DefaultField::new("status", json!("draft"))));
        h.before_update(Arc::new(ValidateContract::<PatchProduct>::new(ERROR_MESSAGE)));
    });
    Ok(())
}
