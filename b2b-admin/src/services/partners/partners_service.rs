//! Factories and exporters.
//!
//! On top of tenant scoping, partner users only see their own side of
//! the supply chain:
//!
//! | role       | factories                   | exporters                         |
//! |------------|-----------------------------|-----------------------------------|
//! | `factory`  | its own row                 | the exporter its factory belongs to |
//! | `exporter` | factories with its exporter | its own row                       |
//!
//! Any other role gets plain scope filtering. A partner role whose
//! identifier is missing from the context sees nothing.

use anyhow::Result;
use async_trait::async_trait;
use b2b_core::table::ID;
use b2b_core::{payload_object, B2BService, ListQuery, Page, RequestContext};
use b2b_store::{Predicate, Row};
use serde_json::Value;

use crate::services::crud::ScopedCrud;

pub const FACTORY_ROLE: &str = "factory";
pub const EXPORTER_ROLE: &str = "exporter";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartnerKind {
    Factory,
    Exporter,
}

#[derive(Clone)]
pub struct PartnersService {
    kind: PartnerKind,
    crud: ScopedCrud,
    /// The factories table, used to resolve a factory user's exporter.
    factories: ScopedCrud,
}

fn nothing() -> Vec<Predicate> {
    vec![Predicate::is_in(ID, Vec::<String>::new())]
}

impl PartnersService {
    pub fn new(kind: PartnerKind, crud: ScopedCrud, factories: ScopedCrud) -> Self {
        Self {
            kind,
            crud,
            factories,
        }
    }

    /// Extra predicates restricting what a partner user may see.
    pub async fn visibility(&self, ctx: &RequestContext) -> Result<Vec<Predicate>> {
        let role = ctx.role.as_str();
        let factory = ctx.factory_id.as_deref().filter(|s| !s.trim().is_empty());
        let exporter = ctx.exporter_id.as_deref().filter(|s| !s.trim().is_empty());

        let extra = match (self.kind, role) {
            (PartnerKind::Factory, FACTORY_ROLE) => match factory {
                Some(id) => vec![Predicate::eq(ID, id)],
                None => nothing(),
            },
            (PartnerKind::Factory, EXPORTER_ROLE) => match exporter {
                Some(id) => vec![Predicate::eq("exporterId", id)],
                None => nothing(),
            },
            (PartnerKind::Exporter, EXPORTER_ROLE) => match exporter {
                Some(id) => vec![Predicate::eq(ID, id)],
                None => nothing(),
            },
            (PartnerKind::Exporter, FACTORY_ROLE) => match factory {
                Some(id) => self.exporter_of_factory(ctx, id).await?,
                None => nothing(),
            },
            _ => Vec::new(),
        };
        Ok(extra)
    }

    async fn exporter_of_factory(&self, ctx: &RequestContext, factory_id: &str) -> Result<Vec<Predicate>> {
        let row = self.factories.get(ctx, factory_id).await?;
        let exporter = row
            .as_ref()
            .and_then(|r| r.get("exporterId"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty());
        Ok(match exporter {
            Some(id) => vec![Predicate::eq(ID, id)],
            None => nothing(),
        })
    }
}

#[async_trait]
impl B2BService for PartnersService {
    async fn list(&self, ctx: &RequestContext, query: ListQuery) -> Result<Page> {
        let extra = self.visibility(ctx).await?;
        self.crud
            .list_in(self.crud.store().as_ref(), ctx, query, &extra)
            .await
    }

    async fn get(&self, ctx: &RequestContext, id: &str) -> Result<Option<Row>> {
        let extra = self.visibility(ctx).await?;
        self.crud.get_in(self.crud.store().as_ref(), ctx, id, &extra).await
    }

    async fn create(&self, ctx: &RequestContext, data: Value) -> Result<Row> {
        self.crud.create(ctx, payload_object(data)?).await
    }

    async fn update(&self, ctx: &RequestContext, id: &str, data: Value) -> Result<Option<Row>> {
        let extra = self.visibility(ctx).await?;
        self.crud
            .update_in(self.crud.store().as_ref(), ctx, id, payload_object(data)?, &extra)
            .await
    }

    async fn remove(&self, ctx: &RequestContext, id: &str) -> Result<bool> {
        let extra = self.visibility(ctx).await?;
        self.crud
            .remove_in(self.crud.store().as_ref(), ctx, id, &extra)
            .await
    }
}
