//! `RequestContext` from request headers.
//!
//! The upstream auth layer resolves the caller and forwards the result as
//! headers:
//!
//! | header | field |
//! |---|---|
//! | `x-tenant-id` (required) | `tenant_id` |
//! | `x-user-id` (required) | `user_id` |
//! | `x-role` | `role` |
//! | `x-site-id` | `site_id` |
//! | `x-factory-id` | `factory_id` |
//! | `x-exporter-id` | `exporter_id` |
//! | `x-dept-id`, `x-current-dept-id` | `dept_id` |
//! | `x-permissions` (comma separated) | `permissions` |

use axum::http::HeaderMap;
use b2b_core::errors::B2BError;
use b2b_core::RequestContext;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const USER_HEADER: &str = "x-user-id";
pub const ROLE_HEADER: &str = "x-role";
pub const SITE_HEADER: &str = "x-site-id";
pub const FACTORY_HEADER: &str = "x-factory-id";
pub const EXPORTER_HEADER: &str = "x-exporter-id";
pub const DEPT_HEADER: &str = "x-dept-id";
pub const CURRENT_DEPT_HEADER: &str = "x-current-dept-id";
pub const PERMISSIONS_HEADER: &str = "x-permissions";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Build the caller's context, or `NotAuthenticated` when the tenant or
/// user is missing.
pub fn context_from_headers(headers: &HeaderMap) -> Result<RequestContext, B2BError> {
    let tenant = header(headers, TENANT_HEADER)
        .ok_or_else(|| B2BError::not_authenticated(format!("Missing {TENANT_HEADER} header")))?;
    let user = header(headers, USER_HEADER)
        .ok_or_else(|| B2BError::not_authenticated(format!("Missing {USER_HEADER} header")))?;

    let mut ctx = RequestContext::new(tenant, user);
    ctx.role = header(headers, ROLE_HEADER).unwrap_or_default().to_string();
    ctx.site_id = header(headers, SITE_HEADER).map(str::to_string);
    ctx.factory_id = header(headers, FACTORY_HEADER).map(str::to_string);
    ctx.exporter_id = header(headers, EXPORTER_HEADER).map(str::to_string);
    ctx.dept_id = header(headers, DEPT_HEADER)
        .or_else(|| header(headers, CURRENT_DEPT_HEADER))
        .map(str::to_string);
    ctx.permissions = header(headers, PERMISSIONS_HEADER)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(ctx)
}
