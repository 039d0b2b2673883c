use std::sync::Arc;

use anyhow::Result;
use b2b_core::schema::ValidateContract;
use b2b_core::B2BApp;

use super::roles_schema::{CreateRole, PatchRole, ERROR_MESSAGE};
use crate::services::crud::ScopedCrud;

pub const SERVICE: &str = "roles";

pub fn configure(app: &B2BApp, crud: ScopedCrud) -> Result<()> {
    app.register_service(SERVICE, Arc::new(crud));

    app.service(SERVICE)?.hooks(|h| {
        h.before_create(Arc::new(ValidateContract::<CreateRole>::new(ERROR_MESSAGE)));
        h.before_update(Arc::new(ValidateContract::<PatchRole>::new(ERROR_MESSAGE)));
    });
    Ok(())
}
