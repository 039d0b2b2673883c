use std::sync::Arc;

use anyhow::Result;
use b2b_core::{B2BApp, TableDef};
use b2b_store::Store;

pub mod crud;
pub mod tables;
pub mod tree;

pub mod departments;
pub mod inquiries;
pub mod media;
pub mod partners;
pub mod products;
pub mod quotations;
pub mod roles;
pub mod site_categories;
pub mod sites;
pub mod skus;
pub mod templates;
pub mod user_site_roles;

pub use crud::{CrudSettings, ScopedCrud};

/// Register every admin service, with its hooks, on `app`.
pub fn configure(app: &B2BApp, store: Arc<dyn Store>, settings: CrudSettings) -> Result<()> {
    let crud = |table: TableDef| ScopedCrud::new(Arc::clone(&store), table, settings);

    let product_gallery = media::MediaLinks::new(
        crud(tables::PRODUCT_MEDIA),
        crud(tables::MEDIA),
        "productId",
        "mediaIds",
        "media",
    );
    let sku_images = media::MediaLinks::new(
        crud(tables::SKU_MEDIA),
        crud(tables::MEDIA),
        "skuId",
        "imageIds",
        "images",
    );

    departments::configure(app, crud(tables::DEPARTMENTS))?;
    sites::configure(app, crud(tables::SITES))?;
    partners::configure(app, crud(tables::FACTORIES), crud(tables::EXPORTERS))?;
    media::configure(app, crud(tables::MEDIA))?;
    products::configure(
        app,
        products::ProductsService::new(
            crud(tables::PRODUCTS),
            crud(tables::SKUS),
            sku_images.clone(),
            product_gallery,
        ),
    )?;
    skus::configure(
        app,
        skus::SkusService::new(crud(tables::SKUS), crud(tables::PRODUCTS), sku_images),
    )?;
    site_categories::configure(app, crud(tables::SITE_CATEGORIES))?;
    templates::configure(
        app,
        templates::TemplatesService::new(
            crud(tables::TEMPLATES),
            crud(tables::TEMPLATE_ATTRIBUTES),
            crud(tables::ATTRIBUTE_VALUES),
        ),
    )?;
    inquiries::configure(app, crud(tables::INQUIRIES))?;
    quotations::configure(app, crud(tables::QUOTATIONS))?;
    roles::configure(app, crud(tables::ROLES))?;
    user_site_roles::configure(
        app,
        user_site_roles::UserSiteRolesService::new(crud(tables::USER_SITE_ROLES), crud(tables::ROLES)),
    )?;

    tracing::debug!(services = app.service_names().len(), policy = ?settings.policy, "services configured");
    Ok(())
}
