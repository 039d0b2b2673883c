use std::sync::Arc;

use anyhow::Result;
use b2b_core::schema::ValidateContract;
use b2b_core::B2BApp;

use super::partners_schema::{CreatePartner, PatchPartner, EXPORTER_ERROR_MESSAGE, FACTORY_ERROR_MESSAGE};
use super::{PartnerKind, PartnersService};
use crate::services::crud::ScopedCrud;

pub const FACTORIES: &str = "factories";
pub const EXPORTERS: &str = "exporters";

pub fn configure(app: &B2BApp, factories: ScopedCrud, exporters: ScopedCrud) -> Result<()> {
    app.register_service(
        FACTORIES,
        Arc::new(PartnersService::new(PartnerKind::Factory, factories.clone(), factories.clone())),
    );
    app.register_service(
        EXPORTERS,
        Arc::new(PartnersService::new(PartnerKind::Exporter, exporters, factories)),
    );

    app.service(FACTORIES)?.hooks(|h| {
        h.before_create(Arc::new(ValidateContract::<CreatePartner>::new(FACTORY_ERROR_MESSAGE)));
        h.before_update(Arc::new(ValidateContract::<PatchPartner>::new(FACTORY_ERROR_MESSAGE)));
    });
    app.service(EXPORTERS)?.hooks(|h| {
        h.before_create(Arc::new(ValidateContract::<CreatePartner>::new(EXPORTER_ERROR_MESSAGE)));
        h.before_update(Arc::new(ValidateContract::<PatchPartner>::new(EXPORTER_ERROR_MESSAGE)));
    });
    Ok(())
}
