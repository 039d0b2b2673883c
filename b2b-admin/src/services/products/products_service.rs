use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use b2b_core::{payload_object, B2BService, ListQuery, Page, RequestContext};
use b2b_store::{Executor, Predicate, Row, Store, Transaction};
use serde_json::Value;

use crate::services::crud::{row_id, take_array, take_ids, ScopedCrud};
use crate::services::media::MediaLinks;

pub const SKUS_FIELD: &str = "skus";
pub const SKU_COUNT_FIELD: &str = "skuCount";
const PRODUCT_ID: &str = "productId";
const SITE_ID: &str = "siteId";

/// Products with their SKUs and gallery.
///
/// Reads attach `media` and `skuCount`. Writes accept `skus` and
/// `mediaIds`, replacing both sets in the same transaction as the
/// product row.
#[derive(Clone)]
pub struct ProductsService {
    products: ScopedCrud,
    skus: ScopedCrud,
    sku_images: MediaLinks,
    gallery: MediaLinks,
}

impl ProductsService {
    pub fn new(products: ScopedCrud, skus: ScopedCrud, sku_images: MediaLinks, gallery: MediaLinks) -> Self {
        Self {
            products,
            skus,
            sku_images,
            gallery,
        }
    }

    fn store(&self) -> &dyn Store {
        self.products.store().as_ref()
    }

    /// Replace every SKU of `product` with `items`.
    ///
    /// New SKUs inherit the product's `siteId`; an item may carry
    /// `imageIds` for its own gallery.
    pub async fn replace_product_skus<E>(
        &self,
        exec: &E,
        ctx: &RequestContext,
        product: &Row,
        items: Vec<Value>,
    ) -> Result<Vec<Row>>
    where
        E: Executor + ?Sized,
    {
        let Some(product_id) = row_id(product) else {
            return Ok(Vec::new());
        };

        let existing: Vec<String> = self
            .skus
            .select_in(exec, ctx, &[Predicate::eq(PRODUCT_ID, product_id)], None)
            .await?
            .iter()
            .filter_map(row_id)
            .map(str::to_string)
            .collect();
        self.sku_images.unlink(exec, ctx, &existing).await?;
        self.skus
            .delete_in(exec, ctx, &[Predicate::eq(PRODUCT_ID, product_id)])
            .await?;

        let site = product.get(SITE_ID).filter(|v| !v.is_null()).cloned();
        let mut created = Vec::with_capacity(items.len());
        for item in items {
            let mut sku = payload_object(item)?;
            let image_ids = take_ids(&mut sku, self.sku_images.input_field())?;
            sku.insert(PRODUCT_ID.to_string(), Value::from(product_id));
            if let Some(site) = &site {
                sku.insert(SITE_ID.to_string(), site.clone());
            }

            let sku = self.skus.create_in(exec, ctx, sku).await?;
            if let (Some(ids), Some(sku_id)) = (image_ids, row_id(&sku)) {
                self.sku_images.replace(exec, ctx, sku_id, &ids).await?;
            }
            created.push(sku);
        }

        tracing::debug!(product = product_id, count = created.len(), "product skus replaced");
        Ok(created)
    }

    /// Put every SKU of `product` on the product's current site.
    pub async fn move_product_skus<E>(&self, exec: &E, ctx: &RequestContext, product: &Row) -> Result<()>
    where
        E: Executor + ?Sized,
    {
        let Some(product_id) = row_id(product) else {
            return Ok(());
        };
        let site = product.get(SITE_ID).cloned().unwrap_or(Value::Null);
        let mut patch = Row::new();
        patch.insert(SITE_ID.to_string(), site);
        let moved = self
            .skus
            .update_all_in(exec, ctx, &[Predicate::eq(PRODUCT_ID, product_id)], patch)
            .await?;
        tracing::debug!(product = product_id, skus = moved.len(), "product skus moved with their product");
        Ok(())
    }

    /// Replace the product gallery with `media_ids`, in order.
    pub async fn replace_product_media<E>(
        &self,
        exec: &E,
        ctx: &RequestContext,
        product_id: &str,
        media_ids: &[String],
    ) -> Result<()>
    where
        E: Executor + ?Sized,
    {
        self.gallery.replace(exec, ctx, product_id, media_ids).await
    }

    /// Attach `media` and `skuCount` to each product.
    pub async fn enrich<E>(&self, exec: &E, ctx: &RequestContext, rows: &mut [Row]) -> Result<()>
    where
        E: Executor + ?Sized,
    {
        if rows.is_empty() {
            return Ok(());
        }
        self.gallery.attach(exec, ctx, rows).await?;

        let ids: Vec<String> = rows.iter().filter_map(row_id).map(str::to_string).collect();
        let skus = self
            .skus
            .select_in(exec, ctx, &[Predicate::is_in(PRODUCT_ID, ids)], None)
            .await?;
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for sku in &skus {
            if let Some(pid) = sku.get(PRODUCT_ID).and_then(Value::as_str) {
                *counts.entry(pid).or_default() += 1;
            }
        }

        for row in rows.iter_mut() {
            let count = row_id(row).and_then(|id| counts.get(id)).copied().unwrap_or(0);
            row.insert(SKU_COUNT_FIELD.to_string(), Value::from(count));
        }
        Ok(())
    }

    /// Split a payload into the product columns and the nested sets.
    fn split(&self, data: Value) -> Result<(Row, Option<Vec<Value>>, Option<Vec<String>>)> {
        let mut row = payload_object(data)?;
        let skus = take_array(&mut row, SKUS_FIELD)?;
        let media = take_ids(&mut row, self.gallery.input_field())?;
        Ok((row, skus, media))
    }

    async fn write_children<E>(
        &self,
        exec: &E,
        ctx: &RequestContext,
        product: &Row,
        skus: Option<Vec<Value>>,
        media: Option<Vec<String>>,
    ) -> Result<()>
    where
        E: Executor + ?Sized,
    {
        if let Some(items) = skus {
            self.replace_product_skus(exec, ctx, product, items).await?;
        }
        if let (Some(ids), Some(product_id)) = (media, row_id(product)) {
            self.replace_product_media(exec, ctx, product_id, &ids).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl B2BService for ProductsService {
    async fn list(&self, ctx: &RequestContext, query: ListQuery) -> Result<Page> {
        let mut page = self.products.list(ctx, query).await?;
        self.enrich(self.store(), ctx, &mut page.data).await?;
        Ok(page)
    }

    async fn get(&self, ctx: &RequestContext, id: &str) -> Result<Option<Row>> {
        let Some(row) = self.products.get(ctx, id).await? else {
            return Ok(None);
        };
        let mut rows = [row];
        self.enrich(self.store(), ctx, &mut rows).await?;
        let [row] = rows;
        Ok(Some(row))
    }

    async fn create(&self, ctx: &RequestContext, data: Value) -> Result<Row> {
        let (row, skus, media) = self.split(data)?;

        let tx = self.store().begin().await?;
        let product = self.products.create_in(tx.as_ref(), ctx, row).await?;
        self.write_children(tx.as_ref(), ctx, &product, skus, media).await?;
        tx.commit().await?;

        let mut rows = [product];
        self.enrich(self.store(), ctx, &mut rows).await?;
        let [product] = rows;
        Ok(product)
    }

    async fn update(&self, ctx: &RequestContext, id: &str, data: Value) -> Result<Option<Row>> {
        let (patch, skus, media) = self.split(data)?;
        let moves_site = patch.contains_key(SITE_ID);

        let tx = self.store().begin().await?;
        let Some(product) = self.products.update_in(tx.as_ref(), ctx, id, patch, &[]).await? else {
            return Ok(None);
        };
        if moves_site {
            self.move_product_skus(tx.as_ref(), ctx, &product).await?;
        }
        self.write_children(tx.as_ref(), ctx, &product, skus, media).await?;
        tx.commit().await?;

        let mut rows = [product];
        self.enrich(self.store(), ctx, &mut rows).await?;
        let [product] = rows;
        Ok(Some(product))
    }

    /// Deletes SKU images, SKUs, the gallery and the product together.
    async fn remove(&self, ctx: &RequestContext, id: &str) -> Result<bool> {
        let tx = self.store().begin().await?;
        let exec = tx.as_ref();
        if self.products.get_in(exec, ctx, id, &[]).await?.is_none() {
            return Ok(true);
        }

        let sku_ids: Vec<String> = self
            .skus
            .select_in(exec, ctx, &[Predicate::eq(PRODUCT_ID, id)], None)
            .await?
            .iter()
            .filter_map(row_id)
            .map(str::to_string)
            .collect();
        self.sku_images.unlink(exec, ctx, &sku_ids).await?;
        self.skus
            .delete_in(exec, ctx, &[Predicate::eq(PRODUCT_ID, id)])
            .await?;
        self.gallery.unlink(exec, ctx, &[id.to_string()]).await?;
        self.products.remove_in(exec, ctx, id, &[]).await?;
        tx.commit().await?;

        tracing::debug!(product = id, skus = sku_ids.len(), "product removed with children");
        Ok(true)
    }
}
