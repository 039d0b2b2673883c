//! Attribute templates.
//!
//! A template owns attributes (`template_attributes`) and each attribute
//! owns its allowed values (`attribute_values`). Clients read and write
//! the whole set as one `fields` array:
//!
//! ```json
//! { "name": "Apparel", "fields": [
//!     { "name": "Color", "inputType": "select", "values": ["red", "blue"] }
//! ] }
//! ```

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use b2b_core::errors::B2BError;
use b2b_core::{payload_object, B2BService, ListQuery, Page, RequestContext};
use b2b_store::{Direction, Executor, Predicate, Row, Store, Transaction};
use serde_json::{json, Value};

use super::templates_schema::{InputType, TemplateField, ERROR_MESSAGE};
use crate::services::crud::{row_id, take_array, ScopedCrud};

pub const FIELDS: &str = "fields";
const TEMPLATE_ID: &str = "templateId";
const ATTRIBUTE_ID: &str = "attributeId";

#[derive(Clone)]
pub struct TemplatesService {
    templates: ScopedCrud,
    attributes: ScopedCrud,
    values: ScopedCrud,
}

fn parse_fields(items: Vec<Value>) -> Result<Vec<TemplateField>> {
    serde_json::from_value(Value::Array(items)).map_err(|e| {
        B2BError::unprocessable(ERROR_MESSAGE)
            .with_errors(json!({ FIELDS: [e.to_string()] }))
            .into_anyhow()
    })
}

impl TemplatesService {
    pub fn new(templates: ScopedCrud, attributes: ScopedCrud, values: ScopedCrud) -> Self {
        Self {
            templates,
            attributes,
            values,
        }
    }

    fn store(&self) -> &dyn Store {
        self.templates.store().as_ref()
    }

    async fn attribute_ids<E>(&self, exec: &E, ctx: &RequestContext, template_id: &str) -> Result<Vec<String>>
    where
        E: Executor + ?Sized,
    {
        Ok(self
            .attributes
            .select_in(exec, ctx, &[Predicate::eq(TEMPLATE_ID, template_id)], None)
            .await?
            .iter()
            .filter_map(row_id)
            .map(str::to_string)
            .collect())
    }

    /// Delete the template's attributes and values, then insert `fields`
    /// in order.
    pub async fn replace_template_fields<E>(
        &self,
        exec: &E,
        ctx: &RequestContext,
        template_id: &str,
        fields: &[TemplateField],
    ) -> Result<()>
    where
        E: Executor + ?Sized,
    {
        let old = self.attribute_ids(exec, ctx, template_id).await?;
        if !old.is_empty() {
            self.values
                .delete_in(exec, ctx, &[Predicate::is_in(ATTRIBUTE_ID, old)])
                .await?;
        }
        self.attributes
            .delete_in(exec, ctx, &[Predicate::eq(TEMPLATE_ID, template_id)])
            .await?;

        for (sort, field) in fields.iter().enumerate() {
            let mut attr = Row::new();
            attr.insert(TEMPLATE_ID.to_string(), json!(template_id));
            attr.insert("name".to_string(), json!(field.name.trim()));
            attr.insert(
                "inputType".to_string(),
                json!(field.input_type.unwrap_or(InputType::Text)),
            );
            attr.insert("sort".to_string(), json!(sort));
            let attr = self.attributes.create_in(exec, ctx, attr).await?;
            let Some(attr_id) = row_id(&attr) else {
                continue;
            };

            for (sort, value) in field.values.iter().enumerate() {
                let mut row = Row::new();
                row.insert(ATTRIBUTE_ID.to_string(), json!(attr_id));
                row.insert("value".to_string(), value.clone());
                row.insert("sort".to_string(), json!(sort));
                self.values.create_in(exec, ctx, row).await?;
            }
        }
        tracing::debug!(template = template_id, fields = fields.len(), "template fields replaced");
        Ok(())
    }

    /// Add the denormalized `fields` array to every template row.
    pub async fn attach_fields<E>(&self, exec: &E, ctx: &RequestContext, rows: &mut [Row]) -> Result<()>
    where
        E: Executor + ?Sized,
    {
        let ids: Vec<String> = rows.iter().filter_map(row_id).map(str::to_string).collect();
        if ids.is_empty() {
            return Ok(());
        }

        let attrs = self
            .attributes
            .select_in(
                exec,
                ctx,
                &[Predicate::is_in(TEMPLATE_ID, ids)],
                Some(("sort", Direction::Asc)),
            )
            .await?;
        let attr_ids: Vec<String> = attrs.iter().filter_map(row_id).map(str::to_string).collect();
        let values = if attr_ids.is_empty() {
            Vec::new()
        } else {
            self.values
                .select_in(
                    exec,
                    ctx,
                    &[Predicate::is_in(ATTRIBUTE_ID, attr_ids)],
                    Some(("sort", Direction::Asc)),
                )
                .await?
        };

        let mut values_by_attr: HashMap<&str, Vec<Value>> = HashMap::new();
        for v in &values {
            if let Some(attr_id) = v.get(ATTRIBUTE_ID).and_then(Value::as_str) {
                values_by_attr
                    .entry(attr_id)
                    .or_default()
                    .push(v.get("value").cloned().unwrap_or(Value::Null));
            }
        }

        let mut fields_by_template: HashMap<&str, Vec<Value>> = HashMap::new();
        for attr in &attrs {
            let (Some(id), Some(template_id)) =
                (row_id(attr), attr.get(TEMPLATE_ID).and_then(Value::as_str))
            else {
                continue;
            };
            fields_by_template.entry(template_id).or_default().push(json!({
                "id": id,
                "name": attr.get("name").cloned().unwrap_or(Value::Null),
                "inputType": attr.get("inputType").cloned().unwrap_or(Value::Null),
                "sort": attr.get("sort").cloned().unwrap_or(Value::Null),
                "values": values_by_attr.get(id).cloned().unwrap_or_default(),
            }));
        }

        for row in rows.iter_mut() {
            let fields = row_id(row)
                .and_then(|id| fields_by_template.get(id))
                .cloned()
                .unwrap_or_default();
            row.insert(FIELDS.to_string(), Value::Array(fields));
        }
        Ok(())
    }

    /// Remove a template with its attributes and values.
    ///
    /// Fails with `NotFound` when the template is not visible.
    pub async fn remove_template(&self, ctx: &RequestContext, id: &str) -> Result<()> {
        let tx = self.store().begin().await?;
        if self.templates.get_in(tx.as_ref(), ctx, id, &[]).await?.is_none() {
            return Err(B2BError::not_found("attribute template does not exist").into_anyhow());
        }

        let attr_ids = self.attribute_ids(tx.as_ref(), ctx, id).await?;
        if !attr_ids.is_empty() {
            self.values
                .delete_in(tx.as_ref(), ctx, &[Predicate::is_in(ATTRIBUTE_ID, attr_ids.clone())])
                .await?;
        }
        self.attributes
            .delete_in(tx.as_ref(), ctx, &[Predicate::eq(TEMPLATE_ID, id)])
            .await?;
        self.templates.remove_in(tx.as_ref(), ctx, id, &[]).await?;
        tx.commit().await?;

        tracing::debug!(template = id, attributes = attr_ids.len(), "template removed");
        Ok(())
    }

    async fn with_fields(&self, ctx: &RequestContext, row: Row) -> Result<Row> {
        let mut rows = [row];
        self.attach_fields(self.store(), ctx, &mut rows).await?;
        let [row] = rows;
        Ok(row)
    }

    fn split(data: Value) -> Result<(Row, Option<Vec<TemplateField>>)> {
        let mut row = payload_object(data)?;
        let fields = take_array(&mut row, FIELDS)?.map(parse_fields).transpose()?;
        Ok((row, fields))
    }
}

#[async_trait]
impl B2BService for TemplatesService {
    async fn list(&self, ctx: &RequestContext, query: ListQuery) -> Result<Page> {
        let mut page = self.templates.list(ctx, query).await?;
        self.attach_fields(self.store(), ctx, &mut page.data).await?;
        Ok(page)
    }

    async fn get(&self, ctx: &RequestContext, id: &str) -> Result<Option<Row>> {
        match self.templates.get(ctx, id).await? {
            Some(row) => Ok(Some(self.with_fields(ctx, row).await?)),
            None => Ok(None),
        }
    }

    async fn create(&self, ctx: &RequestContext, data: Value) -> Result<Row> {
        let (row, fields) = Self::split(data)?;

        let tx = self.store().begin().await?;
        let template = self.templates.create_in(tx.as_ref(), ctx, row).await?;
        if let (Some(fields), Some(id)) = (&fields, row_id(&template)) {
            self.replace_template_fields(tx.as_ref(), ctx, id, fields).await?;
        }
        tx.commit().await?;

        self.with_fields(ctx, template).await
    }

    async fn update(&self, ctx: &RequestContext, id: &str, data: Value) -> Result<Option<Row>> {
        let (patch, fields) = Self::split(data)?;

        let tx = self.store().begin().await?;
        let Some(template) = self.templates.update_in(tx.as_ref(), ctx, id, patch, &[]).await? else {
            return Ok(None);
        };
        if let Some(fields) = &fields {
            self.replace_template_fields(tx.as_ref(), ctx, id, fields).await?;
        }
        tx.commit().await?;

        Ok(Some(self.with_fields(ctx, template).await?))
    }

    async fn remove(&self, ctx: &RequestContext, id: &str) -> Result<bool> {
        self.remove_template(ctx, id).await?;
        Ok(true)
    }
}
