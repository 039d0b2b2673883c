//! Column manifests of every domain table.

use b2b_core::{ScopeAxes, ScopeAxis, TableDef};

const TENANT_SITE: ScopeAxes = ScopeAxes::TENANT.with(ScopeAxis::Site);
const SITE: ScopeAxes = ScopeAxes::NONE.with(ScopeAxis::Site);

pub const DEPARTMENTS: TableDef =
    TableDef::new("departments", &["name", "parentId", "sort", "managerId"])
        .scoped(ScopeAxes::TENANT)
        .searchable("name");

pub const SITES: TableDef =
    TableDef::new("sites", &["name", "kind", "domain", "factoryId", "exporterId", "status"])
        .scoped(ScopeAxes::TENANT)
        .searchable("name");

pub const FACTORIES: TableDef =
    TableDef::new("factories", &["name", "exporterId", "contact", "phone", "address"])
        .scoped(ScopeAxes::TENANT)
        .searchable("name");

pub const EXPORTERS: TableDef = TableDef::new("exporters", &["name", "contact", "phone", "address"])
    .scoped(ScopeAxes::TENANT)
    .searchable("name");

/// Tenant admins without a site or factory see the whole catalogue.
pub const PRODUCTS: TableDef = TableDef::new(
    "products",
    &["name", "description", "categoryId", "templateId", "price", "status"],
)
.scoped(TENANT_SITE.with(ScopeAxis::Factory))
.absent_ok(SITE.with(ScopeAxis::Factory))
.searchable("name");

pub const SKUS: TableDef = TableDef::new(
    "skus",
    &["productId", "code", "name", "price", "stock", "attributes"],
)
.scoped(TENANT_SITE)
.absent_ok(SITE)
.searchable("code");

pub const SKU_MEDIA: TableDef = TableDef::new("sku_media", &["skuId", "mediaId", "sort"])
    .scoped(ScopeAxes::TENANT)
    .without_timestamps();

pub const PRODUCT_MEDIA: TableDef = TableDef::new("product_media", &["productId", "mediaId", "sort"])
    .scoped(ScopeAxes::TENANT)
    .without_timestamps();

/// The media library belongs to one site; callers must name it.
pub const MEDIA: TableDef = TableDef::new("media", &["name", "url", "mimeType", "size"])
    .scoped(TENANT_SITE)
    .searchable("name");

/// Each storefront keeps its own category tree.
pub const SITE_CATEGORIES: TableDef =
    TableDef::new("site_categories", &["name", "parentId", "sort", "slug"])
        .scoped(TENANT_SITE)
        .searchable("name");

pub const TEMPLATES: TableDef = TableDef::new("templates", &["name", "description"])
    .scoped(ScopeAxes::TENANT)
    .searchable("name");

pub const TEMPLATE_ATTRIBUTES: TableDef =
    TableDef::new("template_attributes", &["templateId", "name", "inputType", "sort"])
        .scoped(ScopeAxes::TENANT);

pub const ATTRIBUTE_VALUES: TableDef =
    TableDef::new("attribute_values", &["attributeId", "value", "sort"])
        .scoped(ScopeAxes::TENANT)
        .without_timestamps();

pub const INQUIRIES: TableDef = TableDef::new(
    "inquiries",
    &["productId", "contactName", "email", "company", "message", "status"],
)
.scoped(TENANT_SITE.with(ScopeAxis::Dept).with(ScopeAxis::Factory))
.absent_ok(SITE.with(ScopeAxis::Dept).with(ScopeAxis::Factory))
.searchable("contactName");

pub const QUOTATIONS: TableDef = TableDef::new(
    "quotations",
    &["inquiryId", "currency", "amount", "status", "items", "validUntil"],
)
.scoped(TENANT_SITE.with(ScopeAxis::Dept).with(ScopeAxis::Exporter))
.absent_ok(SITE.with(ScopeAxis::Dept).with(ScopeAxis::Exporter));

pub const ROLES: TableDef = TableDef::new("roles", &["name", "code", "permissions"])
    .scoped(ScopeAxes::TENANT)
    .searchable("name");

/// Tenant admins assign roles across all sites.
pub const USER_SITE_ROLES: TableDef = TableDef::new("user_site_roles", &["userId", "roleId"])
    .scoped(TENANT_SITE)
    .absent_ok(SITE);

pub const ALL: [TableDef; 17] = [
    DEPARTMENTS,
    SITES,
    FACTORIES,
    EXPORTERS,
    PRODUCTS,
    SKUS,
    SKU_MEDIA,
    PRODUCT_MEDIA,
    MEDIA,
    SITE_CATEGORIES,
    TEMPLATES,
    TEMPLATE_ATTRIBUTES,
    ATTRIBUTE_VALUES,
    INQUIRIES,
    QUOTATIONS,
    ROLES,
    USER_SITE_ROLES,
];
