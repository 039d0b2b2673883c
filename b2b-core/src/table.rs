use crate::scope::ScopeAxes;

pub const ID: &str = "id";
pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

/// Static column manifest of one domain table.
///
/// Declared as a `const` next to each service, e.g.
///
/// ```rust
/// use b2b_core::scope::{ScopeAxes, ScopeAxis};
/// use b2b_core::table::TableDef;
///
/// const MEDIA: TableDef = TableDef::new("media", &["name", "url", "mimeType"])
///     .scoped(ScopeAxes::TENANT.with(ScopeAxis::Site))
///     .absent_ok(ScopeAxes::NONE.with(ScopeAxis::Site))
///     .searchable("name");
///
/// assert!(MEDIA.has_column("siteId"));
/// assert!(MEDIA.has_column("createdAt"));
/// assert!(!MEDIA.has_column("price"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    /// Data columns, excluding `id`, scope columns and timestamps.
    pub columns: &'static [&'static str],
    pub scope: ScopeAxes,
    /// Scope axes a caller may leave unresolved under the strict policy.
    pub absent_ok: ScopeAxes,
    pub search_column: Option<&'static str>,
    pub timestamps: bool,
}

impl TableDef {
    pub const fn new(name: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            name,
            columns,
            scope: ScopeAxes::NONE,
            absent_ok: ScopeAxes::NONE,
            search_column: None,
            timestamps: true,
        }
    }

    pub const fn scoped(self, scope: ScopeAxes) -> Self {
        Self { scope, ..self }
    }

    pub const fn absent_ok(self, absent_ok: ScopeAxes) -> Self {
        Self { absent_ok, ..self }
    }

    pub const fn searchable(self, column: &'static str) -> Self {
        Self {
            search_column: Some(column),
            ..self
        }
    }

    pub const fn without_timestamps(self) -> Self {
        Self {
            timestamps: false,
            ..self
        }
    }

    pub fn is_scope_column(&self, column: &str) -> bool {
        self.scope.has_column(column)
    }

    pub fn is_timestamp_column(&self, column: &str) -> bool {
        self.timestamps && (column == CREATED_AT || column == UPDATED_AT)
    }

    pub fn has_column(&self, column: &str) -> bool {
        column == ID
            || self.columns.contains(&column)
            || self.is_scope_column(column)
            || self.is_timestamp_column(column)
    }

    pub fn created_at(&self) -> Option<&'static str> {
        self.timestamps.then_some(CREATED_AT)
    }

    pub fn updated_at(&self) -> Option<&'static str> {
        self.timestamps.then_some(UPDATED_AT)
    }
}
