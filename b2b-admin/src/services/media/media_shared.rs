use std::sync::Arc;

use anyhow::Result;
use b2b_core::schema::ValidateContract;
use b2b_core::B2BApp;

use super::media_schema::{CreateMedia, PatchMedia, ERROR_MESSAGE};
use crate::services::crud::ScopedCrud;

pub const SERVICE: &str = "media";

/// The media library. Products and SKUs reference it through link
/// tables (see `MediaLinks`); links to removed media are skipped when
/// attached.
pub fn configure(app: &B2BApp, crud: ScopedCrud) -> Result<()> {
    app.register_service(SERVICE, Arc::new(crud));

    app.service(SERVICE)?.hooks(|h| {
        h.before_create(Arc::new(ValidateContract::<CreateMedia>::new(ERROR_MESSAGE)));
        h.before_update(Arc::new(ValidateContract::<PatchMedia>::new(ERROR_MESSAGE)));
    });
    Ok(())
}
