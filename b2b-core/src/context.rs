//! Per-request caller identity.

use std::collections::BTreeSet;

/// Context carried with every service call.
///
/// Built once per request by the transport from the authenticated
/// session, passed by reference into services and hooks, never mutated.
/// Services only read the identifier fields for row scoping; `role` and
/// `permissions` belong to the hooks that enforce permission tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: String,
    pub tenant_id: String,
    pub site_id: Option<String>,
    pub factory_id: Option<String>,
    pub exporter_id: Option<String>,
    pub dept_id: Option<String>,
    pub role: String,
    pub permissions: BTreeSet<String>,
}

impl RequestContext {
    /// Convenience constructor from a tenant and a user.
    pub fn new<T: Into<String>, U: Into<String>>(tenant: T, user: U) -> Self {
        Self {
            tenant_id: tenant.into(),
            user_id: user.into(),
            ..Self::default()
        }
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site_id = Some(site.into());
        self
    }

    pub fn with_factory(mut self, factory: impl Into<String>) -> Self {
        self.factory_id = Some(factory.into());
        self
    }

    pub fn with_exporter(mut self, exporter: impl Into<String>) -> Self {
        self.exporter_id = Some(exporter.into());
        self
    }

    pub fn with_dept(mut self, dept: impl Into<String>) -> Self {
        self.dept_id = Some(dept.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the caller holds `tag` (`"<service>:<action>"`).
    ///
    /// `"*"` grants everything and `"<service>:*"` grants every action
    /// on one service.
    pub fn has_permission(&self, tag: &str) -> bool {
        if self.permissions.contains("*") || self.permissions.contains(tag) {
            return true;
        }
        match tag.split_once(':') {
            Some((service, _)) => self.permissions.contains(&format!("{service}:*")),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards_grant_permissions() {
        let ctx = RequestContext::new("T1", "u1").with_permissions(["products:*", "media:list"]);
        assert!(ctx.has_permission("products:create"));
        assert!(ctx.has_permission("media:list"));
        assert!(!ctx.has_permission("media:remove"));

        let admin = RequestContext::new("T1", "u1").with_permissions(["*"]);
        assert!(admin.has_permission("roles:remove"));
    }
}
