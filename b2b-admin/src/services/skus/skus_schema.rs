use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

pub const ERROR_MESSAGE: &str = "Skus schema validation failed";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSku {
    #[validate(length(min = 1, message = "productId must not be empty"))]
    pub product_id: String,
    #[validate(length(min = 1, max = 64, message = "code must be 1-64 characters"))]
    pub code: String,
    pub name: Option<String>,
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: Option<f64>,
    pub stock: Option<u64>,
    pub attributes: Option<Value>,
    pub image_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PatchSku {
    #[validate(length(min = 1, message = "productId must not be empty"))]
    pub product_id: Option<String>,
    #[validate(length(min = 1, max = 64, message = "code must be 1-64 characters"))]
    pub code: Option<String>,
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: Option<f64>,
    pub stock: Option<u64>,
    pub image_ids: Option<Vec<String>>,
}
