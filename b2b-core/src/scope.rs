//! Row-level scope filtering.
//!
//! A table declares which partitioning axes it carries (`ScopeAxes`).
//! For every axis present on both the table and the caller's
//! `RequestContext`, an equality predicate is ANDed into each read and
//! write, and on insert the caller's value is forced into the row.
//!
//! What happens when the table carries an axis the context does not
//! resolve depends on the `ScopePolicy`:
//!
//! - `Permissive`: the axis is simply not predicated.
//! - `Strict`: the whole operation is denied, unless the table lists
//!   the axis in its `absent_ok` set (e.g. a tenant admin without a
//!   site may see every site's products).

use std::fmt;
use std::str::FromStr;

use b2b_store::{Predicate, Row};
use serde_json::Value;

use crate::context::RequestContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeAxis {
    Tenant,
    Site,
    Dept,
    Factory,
    Exporter,
}

impl ScopeAxis {
    /// Every axis, in predicate emission order.
    pub const ALL: [ScopeAxis; 5] = [
        ScopeAxis::Tenant,
        ScopeAxis::Site,
        ScopeAxis::Dept,
        ScopeAxis::Factory,
        ScopeAxis::Exporter,
    ];

    pub fn column(self) -> &'static str {
        match self {
            ScopeAxis::Tenant => "tenantId",
            ScopeAxis::Site => "siteId",
            ScopeAxis::Dept => "deptId",
            ScopeAxis::Factory => "factoryId",
            ScopeAxis::Exporter => "exporterId",
        }
    }

    /// The caller's identifier on this axis. Empty strings count as absent.
    pub fn context_value(self, ctx: &RequestContext) -> Option<&str> {
        let v = match self {
            ScopeAxis::Tenant => Some(ctx.tenant_id.as_str()),
            ScopeAxis::Site => ctx.site_id.as_deref(),
            ScopeAxis::Dept => ctx.dept_id.as_deref(),
            ScopeAxis::Factory => ctx.factory_id.as_deref(),
            ScopeAxis::Exporter => ctx.exporter_id.as_deref(),
        };
        v.filter(|s| !s.trim().is_empty())
    }
}

impl fmt::Display for ScopeAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A set of scope axes, declared per table at compile time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeAxes {
    tenant: bool,
    site: bool,
    dept: bool,
    factory: bool,
    exporter: bool,
}

impl ScopeAxes {
    pub const NONE: ScopeAxes = ScopeAxes {
        tenant: false,
        site: false,
        dept: false,
        factory: false,
        exporter: false,
    };

    pub const TENANT: ScopeAxes = ScopeAxes::NONE.with(ScopeAxis::Tenant);

    pub const fn with(self, axis: ScopeAxis) -> Self {
        match axis {
            ScopeAxis::Tenant => ScopeAxes { tenant: true, ..self },
            ScopeAxis::Site => ScopeAxes { site: true, ..self },
            ScopeAxis::Dept => ScopeAxes { dept: true, ..self },
            ScopeAxis::Factory => ScopeAxes { factory: true, ..self },
            ScopeAxis::Exporter => ScopeAxes { exporter: true, ..self },
        }
    }

    pub const fn contains(self, axis: ScopeAxis) -> bool {
        match axis {
            ScopeAxis::Tenant => self.tenant,
            ScopeAxis::Site => self.site,
            ScopeAxis::Dept => self.dept,
            ScopeAxis::Factory => self.factory,
            ScopeAxis::Exporter => self.exporter,
        }
    }

    pub fn iter(self) -> impl Iterator<Item = ScopeAxis> {
        ScopeAxis::ALL.into_iter().filter(move |a| self.contains(*a))
    }

    pub fn has_column(self, column: &str) -> bool {
        self.iter().any(|a| a.column() == column)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScopePolicy {
    Permissive,
    #[default]
    Strict,
}

impl FromStr for ScopePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "permissive" => Ok(ScopePolicy::Permissive),
            "strict" => Ok(ScopePolicy::Strict),
            other => Err(anyhow::anyhow!(
                "invalid scope policy '{other}', expected 'strict' or 'permissive'"
            )),
        }
    }
}

/// Outcome of resolving a caller's scope against a table.
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    /// Predicates to AND into every statement.
    Filter(Vec<Predicate>),
    /// The table requires an axis the caller does not resolve.
    DenyAll { axis: ScopeAxis },
}

impl Scope {
    pub fn predicates(&self) -> Option<&[Predicate]> {
        match self {
            Scope::Filter(p) => Some(p),
            Scope::DenyAll { .. } => None,
        }
    }

    pub fn is_deny_all(&self) -> bool {
        matches!(self, Scope::DenyAll { .. })
    }
}

/// One equality predicate per axis present on both the table and the
/// context, in `ScopeAxis::ALL` order. Axes the context lacks are skipped.
pub fn scope_predicates(axes: ScopeAxes, ctx: &RequestContext) -> Vec<Predicate> {
    axes.iter()
        .filter_map(|axis| {
            axis.context_value(ctx)
                .map(|v| Predicate::eq(axis.column(), v))
        })
        .collect()
}

/// Resolve the caller's scope on a table under `policy`.
pub fn build_scope(
    axes: ScopeAxes,
    absent_ok: ScopeAxes,
    ctx: &RequestContext,
    policy: ScopePolicy,
) -> Scope {
    if policy == ScopePolicy::Strict {
        let missing = axes
            .iter()
            .find(|axis| axis.context_value(ctx).is_none() && !absent_ok.contains(*axis));
        if let Some(axis) = missing {
            return Scope::DenyAll { axis };
        }
    }
    Scope::Filter(scope_predicates(axes, ctx))
}

/// Force the caller's identifiers into `row` on every axis the table and
/// context share, overwriting whatever the client sent.
pub fn inject_scope(axes: ScopeAxes, ctx: &RequestContext, row: &mut Row) {
    for axis in axes.iter() {
        if let Some(v) = axis.context_value(ctx) {
            row.insert(axis.column().to_string(), Value::String(v.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PRODUCT_AXES: ScopeAxes = ScopeAxes::TENANT
        .with(ScopeAxis::Site)
        .with(ScopeAxis::Factory);

    #[test]
    fn predicates_follow_emission_order_and_skip_absent_axes() {
        let ctx = RequestContext::new("T1", "u1")
            .with_factory("F1")
            .with_dept("D1");
        let preds = scope_predicates(PRODUCT_AXES, &ctx);
        assert_eq!(
            preds,
            vec![Predicate::eq("tenantId", "T1"), Predicate::eq("factoryId", "F1")]
        );
    }

    #[test]
    fn scope_is_deterministic() {
        let ctx = RequestContext::new("T1", "u1").with_site("S1");
        assert_eq!(
            scope_predicates(PRODUCT_AXES, &ctx),
            scope_predicates(PRODUCT_AXES, &ctx)
        );
    }

    #[test]
    fn strict_denies_missing_axis_unless_whitelisted() {
        let ctx = RequestContext::new("T1", "u1").with_site("S1");

        let scope = build_scope(PRODUCT_AXES, ScopeAxes::NONE, &ctx, ScopePolicy::Strict);
        assert_eq!(scope, Scope::DenyAll { axis: ScopeAxis::Factory });

        let absent_ok = ScopeAxes::NONE.with(ScopeAxis::Factory);
        let scope = build_scope(PRODUCT_AXES, absent_ok, &ctx, ScopePolicy::Strict);
        assert_eq!(
            scope.predicates().unwrap(),
            &[Predicate::eq("tenantId", "T1"), Predicate::eq("siteId", "S1")]
        );
    }

    #[test]
    fn permissive_never_denies() {
        let ctx = RequestContext::new("T1", "u1");
        let scope = build_scope(PRODUCT_AXES, ScopeAxes::NONE, &ctx, ScopePolicy::Permissive);
        assert_eq!(scope, Scope::Filter(vec![Predicate::eq("tenantId", "T1")]));
    }

    #[test]
    fn empty_tenant_counts_as_absent() {
        let ctx = RequestContext::new("  ", "u1");
        let scope = build_scope(ScopeAxes::TENANT, ScopeAxes::NONE, &ctx, ScopePolicy::Strict);
        assert!(scope.is_deny_all());
    }

    #[test]
    fn inject_overrides_client_values() {
        let ctx = RequestContext::new("A", "u1").with_site("S1");
        let mut row = json!({"tenantId": "B", "siteId": "S9", "factoryId": "F9", "name": "x"})
            .as_object()
            .cloned()
            .unwrap();
        inject_scope(PRODUCT_AXES, &ctx, &mut row);
        assert_eq!(row["tenantId"], "A");
        assert_eq!(row["siteId"], "S1");
        // context has no factory, so the client value is left alone
        assert_eq!(row["factoryId"], "F9");
    }

    #[test]
    fn parses_policy() {
        assert_eq!("Strict".parse::<ScopePolicy>().unwrap(), ScopePolicy::Strict);
        assert_eq!(" permissive ".parse::<ScopePolicy>().unwrap(), ScopePolicy::Permissive);
        assert!("open".parse::<ScopePolicy>().is_err());
    }
}
