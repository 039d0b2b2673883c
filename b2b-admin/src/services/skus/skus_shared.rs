use std::sync::Arc;

use anyhow::Result;
use b2b_core::schema::ValidateContract;
use b2b_core::B2BApp;

use super::skus_schema::{CreateSku, PatchSku, ERROR_MESSAGE};
use super::SkusService;

pub const SERVICE: &str = "skus";

pub fn configure(app: &B2BApp, service: SkusService) -> Result<()> {
    app.register_service(SERVICE, Arc::new(service));

    app.service(SERVICE)?.hooks(|h| {
        h.before_create(Arc::new(ValidateContract::<CreateSku>::new(ERROR_MESSAGE)));
        h.before_update(Arc::new(ValidateContract::<PatchSku>::new(ERROR_MESSAGE)));
    });
    Ok(())
}
