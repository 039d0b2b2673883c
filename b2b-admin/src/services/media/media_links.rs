use std::collections::HashMap;

use anyhow::Result;
use b2b_core::errors::B2BError;
use b2b_core::RequestContext;
use b2b_store::{Direction, Executor, Predicate, Row};
use serde_json::{json, Value};

use crate::services::crud::{row_id, ScopedCrud};

/// An ordered association between owner rows and media rows, stored in
/// a link table (`product_media`, `sku_media`).
#[derive(Clone)]
pub struct MediaLinks {
    links: ScopedCrud,
    media: ScopedCrud,
    /// Link column holding the owner's id, e.g. `productId`.
    owner_column: &'static str,
    /// Request field carrying the ids, e.g. `mediaIds`.
    input_field: &'static str,
    /// Output field holding the attached summaries, e.g. `media`.
    output_field: &'static str,
}

impl MediaLinks {
    pub fn new(
        links: ScopedCrud,
        media: ScopedCrud,
        owner_column: &'static str,
        input_field: &'static str,
        output_field: &'static str,
    ) -> Self {
        Self {
            links,
            media,
            owner_column,
            input_field,
            output_field,
        }
    }

    pub fn input_field(&self) -> &'static str {
        self.input_field
    }

    /// Replace the owner's media set with `media_ids`, in order.
    ///
    /// Every id must name a media row visible to the caller
    /// (`Unprocessable` otherwise).
    pub async fn replace<E>(
        &self,
        exec: &E,
        ctx: &RequestContext,
        owner_id: &str,
        media_ids: &[String],
    ) -> Result<()>
    where
        E: Executor + ?Sized,
    {
        let visible = self
            .media
            .select_in(exec, ctx, &[Predicate::is_in("id", media_ids.to_vec())], None)
            .await?;
        let missing: Vec<&String> = media_ids
            .iter()
            .filter(|id| !visible.iter().any(|m| row_id(m) == Some(id.as_str())))
            .collect();
        if !missing.is_empty() {
            let errors: Vec<String> = missing
                .iter()
                .map(|id| format!("media {id} does not exist"))
                .collect();
            return Err(B2BError::unprocessable("Unknown media")
                .with_errors(json!({ self.input_field: errors }))
                .into_anyhow());
        }

        self.unlink(exec, ctx, &[owner_id.to_string()]).await?;

        for (sort, media_id) in media_ids.iter().enumerate() {
            let mut link = Row::new();
            link.insert(self.owner_column.to_string(), json!(owner_id));
            link.insert("mediaId".to_string(), json!(media_id));
            link.insert("sort".to_string(), json!(sort));
            self.links.create_in(exec, ctx, link).await?;
        }
        tracing::debug!(
            table = self.links.table().name,
            owner = owner_id,
            count = media_ids.len(),
            "media links replaced"
        );
        Ok(())
    }

    /// Drop every link of the given owners.
    pub async fn unlink<E>(&self, exec: &E, ctx: &RequestContext, owner_ids: &[String]) -> Result<u64>
    where
        E: Executor + ?Sized,
    {
        if owner_ids.is_empty() {
            return Ok(0);
        }
        self.links
            .delete_in(
                exec,
                ctx,
                &[Predicate::is_in(self.owner_column, owner_ids.to_vec())],
            )
            .await
    }

    /// Add `[{id, url, name}]` summaries to every row, in link order.
    pub async fn attach<E>(&self, exec: &E, ctx: &RequestContext, rows: &mut [Row]) -> Result<()>
    where
        E: Executor + ?Sized,
    {
        let owner_ids: Vec<String> = rows.iter().filter_map(row_id).map(str::to_string).collect();
        if owner_ids.is_empty() {
            return Ok(());
        }

        let links = self
            .links
            .select_in(
                exec,
                ctx,
                &[Predicate::is_in(self.owner_column, owner_ids)],
                Some(("sort", Direction::Asc)),
            )
            .await?;

        let media_ids: Vec<Value> = links
            .iter()
            .filter_map(|l| l.get("mediaId").cloned())
            .collect();
        let mut media: HashMap<String, Row> = HashMap::new();
        if !media_ids.is_empty() {
            let found = self
                .media
                .select_in(exec, ctx, &[Predicate::is_in("id", media_ids)], None)
                .await?;
            for m in found {
                if let Some(id) = row_id(&m).map(str::to_string) {
                    media.insert(id, m);
                }
            }
        }

        let mut by_owner: HashMap<&str, Vec<Value>> = HashMap::new();
        for link in &links {
            let (Some(owner), Some(media_id)) = (
                link.get(self.owner_column).and_then(Value::as_str),
                link.get("mediaId").and_then(Value::as_str),
            ) else {
                continue;
            };
            // media deleted or moved out of scope since it was linked
            let Some(m) = media.get(media_id) else {
                continue;
            };
            by_owner.entry(owner).or_default().push(json!({
                "id": media_id,
                "url": m.get("url").cloned().unwrap_or(Value::Null),
                "name": m.get("name").cloned().unwrap_or(Value::Null),
            }));
        }

        for row in rows.iter_mut() {
            let items = row_id(row)
                .and_then(|id| by_owner.get(id))
                .cloned()
                .unwrap_or_default();
            row.insert(self.output_field.to_string(), Value::Array(items));
        }
        Ok(())
    }
}
