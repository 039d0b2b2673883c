use std::sync::Arc;

use anyhow::Result;
use b2b_core::schema::ValidateContract;
use b2b_core::B2BApp;

use super::templates_schema::{CreateTemplate, PatchTemplate, ERROR_MESSAGE};
use super::TemplatesService;

pub const SERVICE: &str = "templates";

pub fn configure(app: &B2BApp, service: TemplatesService) -> Result<()> {
    app.register_service(SERVICE, Arc::new(service));

    app.service(SERVICE)?.hooks(|h| {
        h.before_create(Arc::new(ValidateContract::<CreateTemplate>::new(ERROR_MESSAGE)));
        h.before_update(Arc::new(ValidateContract::<PatchTemplate>::new(ERROR_MESSAGE)));
    });
    Ok(())
}
