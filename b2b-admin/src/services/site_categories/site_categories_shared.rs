use std::sync::Arc;

use anyhow::Result;
use b2b_core::schema::ValidateContract;
use b2b_core::B2BApp;

use super::site_categories_schema::{CreateSiteCategory, PatchSiteCategory, ERROR_MESSAGE};
use crate::services::crud::ScopedCrud;
use crate::services::tree::TreeCrud;

pub const SERVICE: &str = "site-categories";

/// Per-site category tree. A category with children cannot be removed.
pub fn configure(app: &B2BApp, crud: ScopedCrud) -> Result<()> {
    app.register_service(SERVICE, Arc::new(TreeCrud::new(crud).guard_children()));

    app.service(SERVICE)?.hooks(|h| {
        h.before_create(Arc::new(ValidateContract::<CreateSiteCategory>::new(ERROR_MESSAGE)));
        h.before_update(Arc::new(ValidateContract::<PatchSiteCategory>::new(ERROR_MESSAGE)));
    });
    Ok(())
}
