use std::sync::Arc;

use anyhow::Result;
use b2b_core::schema::ValidateContract;
use b2b_core::B2BApp;

use super::user_site_roles_schema::{CreateUserSiteRole, ERROR_MESSAGE};
use super::UserSiteRolesService;

pub const SERVICE: &str = "user-site-roles";

pub fn configure(app: &B2BApp, service: UserSiteRolesService) -> Result<()> {
    app.register_service(SERVICE, Arc::new(service));

    app.service(SERVICE)?.hooks(|h| {
        h.before_create(Arc::new(ValidateContract::<CreateUserSiteRole>::new(ERROR_MESSAGE)));
    });
    Ok(())
}
