use serde::Deserialize;
use validator::Validate;

pub const ERROR_MESSAGE: &str = "Quotations schema validation failed";

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotationStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuotationItem {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: u64,
    #[validate(range(min = 0.0, message = "unitPrice must not be negative"))]
    pub unit_price: f64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuotation {
    pub inquiry_id: Option<String>,
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: String,
    #[validate(range(min = 0.0, message = "amount must not be negative"))]
    pub amount: f64,
    pub status: Option<QuotationStatus>,
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<QuotationItem>,
    pub valid_until: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PatchQuotation {
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: Option<String>,
    #[validate(range(min = 0.0, message = "amount must not be negative"))]
    pub amount: Option<f64>,
    pub status: Option<QuotationStatus>,
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<QuotationItem>,
}
