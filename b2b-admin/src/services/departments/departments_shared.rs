use std::sync::Arc;

use anyhow::Result;
use b2b_core::schema::ValidateContract;
use b2b_core::B2BApp;

use super::departments_schema::{CreateDepartment, PatchDepartment, ERROR_MESSAGE};
use crate::services::crud::ScopedCrud;
use crate::services::tree::TreeCrud;

pub const SERVICE: &str = "departments";

/// Departments form a tree; removing a parent leaves its children as roots.
pub fn configure(app: &B2BApp, crud: ScopedCrud) -> Result<()> {
    app.register_service(SERVICE, Arc::new(TreeCrud::new(crud)));

    app.service(SERVICE)?.hooks(|h| {
        h.before_create(Arc::new(ValidateContract::<CreateDepartment>::new(ERROR_MESSAGE)));
        h.before_update(Arc::new(ValidateContract::<PatchDepartment>::new(ERROR_MESSAGE)));
    });
    Ok(())
}
