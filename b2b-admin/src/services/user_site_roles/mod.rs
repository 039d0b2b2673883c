pub mod user_site_roles_schema;
pub mod user_site_roles_service;
pub mod user_site_roles_shared;

pub use user_site_roles_service::UserSiteRolesService;
pub use user_site_roles_shared::{configure, SERVICE};
