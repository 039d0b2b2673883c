use std::sync::Arc;

use anyhow::Result;
use b2b_core::schema::ValidateContract;
use b2b_core::B2BApp;
use serde_json::json;

use super::inquiries_schema::{CreateInquiry, PatchInquiry, ERROR_MESSAGE};
use crate::hooks::DefaultField;
use crate::services::crud::ScopedCrud;

pub const SERVICE: &str = "inquiries";

pub fn configure(app: &B2BApp, crud: ScopedCrud) -> Result<()> {
    app.register_service(SERVICE, Arc::new(crud));

    app.service(SERVICE)?.hooks(|h| {
        h.before_create(Arc::new(ValidateContract::<CreateInquiry>::new(ERROR_MESSAGE)));
        h.before_create(Arc::new(DefaultField::new("status", json!("new"))));
        h.before_update(Arc::new(ValidateContract::<PatchInquiry>::new(ERROR_MESSAGE)));
    });
    Ok(())
}
