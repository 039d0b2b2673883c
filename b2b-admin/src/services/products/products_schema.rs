use serde::Deserialize;
use validator::Validate;

pub const ERROR_MESSAGE: &str = "Products schema validation failed";

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductSku {
    #[validate(length(min = 1, message = "code must not be empty"))]
    pub code: String,
    pub name: Option<String>,
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: Option<f64>,
    pub stock: Option<u64>,
    pub image_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub template_id: Option<String>,
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: Option<f64>,
    pub status: Option<ProductStatus>,
    #[validate(nested)]
    pub skus: Option<Vec<ProductSku>>,
    pub media_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PatchProduct {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: Option<f64>,
    pub status: Option<ProductStatus>,
    #[validate(nested)]
    pub skus: Option<Vec<ProductSku>>,
    pub media_ids: Option<Vec<String>>,
}
