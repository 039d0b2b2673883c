use anyhow::Result;
use async_trait::async_trait;
use b2b_core::errors::B2BError;
use b2b_core::{payload_object, B2BService, ListQuery, Page, RequestContext};
use b2b_store::{Executor, Predicate, Row, Store, Transaction};
use serde_json::{json, Value};

use crate::services::crud::{row_id, take_ids, ScopedCrud};
use crate::services::media::MediaLinks;

const PRODUCT_ID: &str = "productId";

/// SKUs with their own image set (`imageIds` in, `images` out).
///
/// A SKU is only visible while its product is visible to the caller.
#[derive(Clone)]
pub struct SkusService {
    skus: ScopedCrud,
    products: ScopedCrud,
    images: MediaLinks,
}

impl SkusService {
    pub fn new(skus: ScopedCrud, products: ScopedCrud, images: MediaLinks) -> Self {
        Self {
            skus,
            products,
            images,
        }
    }

    fn store(&self) -> &dyn Store {
        self.skus.store().as_ref()
    }

    /// Replace the SKU's images with `media_ids`, in order.
    pub async fn replace_sku_images<E>(
        &self,
        exec: &E,
        ctx: &RequestContext,
        sku_id: &str,
        media_ids: &[String],
    ) -> Result<()>
    where
        E: Executor + ?Sized,
    {
        self.images.replace(exec, ctx, sku_id, media_ids).await
    }

    /// Point `sku` at a product the caller can see, inheriting its site.
    async fn bind_product<E>(&self, exec: &E, ctx: &RequestContext, sku: &mut Row) -> Result<()>
    where
        E: Executor + ?Sized,
    {
        let Some(product_id) = sku.get(PRODUCT_ID).and_then(Value::as_str) else {
            return Ok(());
        };
        let Some(product) = self.products.get_in(exec, ctx, product_id, &[]).await? else {
            return Err(B2BError::unprocessable("Skus schema validation failed")
                .with_errors(json!({ PRODUCT_ID: [format!("product {product_id} does not exist")] }))
                .into_anyhow());
        };
        if let Some(site) = product.get("siteId").filter(|v| !v.is_null()) {
            sku.insert("siteId".to_string(), site.clone());
        }
        Ok(())
    }

    /// Only SKUs of products the caller can see.
    async fn visible_products<E>(&self, exec: &E, ctx: &RequestContext) -> Result<Predicate>
    where
        E: Executor + ?Sized,
    {
        let ids: Vec<String> = self
            .products
            .select_in(exec, ctx, &[], None)
            .await?
            .iter()
            .filter_map(row_id)
            .map(str::to_string)
            .collect();
        Ok(Predicate::is_in(PRODUCT_ID, ids))
    }

    /// The SKU `id` when both it and its product are visible.
    async fn visible_sku<E>(&self, exec: &E, ctx: &RequestContext, id: &str) -> Result<Option<Row>>
    where
        E: Executor + ?Sized,
    {
        let Some(sku) = self.skus.get_in(exec, ctx, id, &[]).await? else {
            return Ok(None);
        };
        let Some(product_id) = sku.get(PRODUCT_ID).and_then(Value::as_str) else {
            return Ok(None);
        };
        if self.products.get_in(exec, ctx, product_id, &[]).await?.is_none() {
            tracing::debug!(sku = id, product = product_id, "sku hidden with its product");
            return Ok(None);
        }
        Ok(Some(sku))
    }

    async fn with_images(&self, ctx: &RequestContext, row: Row) -> Result<Row> {
        let mut rows = [row];
        self.images.attach(self.store(), ctx, &mut rows).await?;
        let [row] = rows;
        Ok(row)
    }
}

#[async_trait]
impl B2BService for SkusService {
    async fn list(&self, ctx: &RequestContext, query: ListQuery) -> Result<Page> {
        let visible = self.visible_products(self.store(), ctx).await?;
        let mut page = self.skus.list_in(self.store(), ctx, query, &[visible]).await?;
        self.images.attach(self.store(), ctx, &mut page.data).await?;
        Ok(page)
    }

    async fn get(&self, ctx: &RequestContext, id: &str) -> Result<Option<Row>> {
        match self.visible_sku(self.store(), ctx, id).await? {
            Some(row) => Ok(Some(self.with_images(ctx, row).await?)),
            None => Ok(None),
        }
    }

    async fn create(&self, ctx: &RequestContext, data: Value) -> Result<Row> {
        let mut sku = payload_object(data)?;
        let image_ids = take_ids(&mut sku, self.images.input_field())?;

        let tx = self.store().begin().await?;
        self.bind_product(tx.as_ref(), ctx, &mut sku).await?;
        let sku = self.skus.create_in(tx.as_ref(), ctx, sku).await?;
        if let (Some(ids), Some(id)) = (image_ids, sku.get("id").and_then(Value::as_str)) {
            self.replace_sku_images(tx.as_ref(), ctx, id, &ids).await?;
        }
        tx.commit().await?;

        self.with_images(ctx, sku).await
    }

    async fn update(&self, ctx: &RequestContext, id: &str, data: Value) -> Result<Option<Row>> {
        let mut patch = payload_object(data)?;
        let image_ids = take_ids(&mut patch, self.images.input_field())?;

        let tx = self.store().begin().await?;
        if self.visible_sku(tx.as_ref(), ctx, id).await?.is_none() {
            return Ok(None);
        }
        self.bind_product(tx.as_ref(), ctx, &mut patch).await?;
        let Some(sku) = self.skus.update_in(tx.as_ref(), ctx, id, patch, &[]).await? else {
            return Ok(None);
        };
        if let Some(ids) = image_ids {
            self.replace_sku_images(tx.as_ref(), ctx, id, &ids).await?;
        }
        tx.commit().await?;

        Ok(Some(self.with_images(ctx, sku).await?))
    }

    async fn remove(&self, ctx: &RequestContext, id: &str) -> Result<bool> {
        let tx = self.store().begin().await?;
        if self.visible_sku(tx.as_ref(), ctx, id).await?.is_some() {
            self.images.unlink(tx.as_ref(), ctx, &[id.to_string()]).await?;
            self.skus.remove_in(tx.as_ref(), ctx, id, &[]).await?;
        }
        tx.commit().await?;
        Ok(true)
    }
}
