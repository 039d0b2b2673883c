use serde::Deserialize;
use validator::Validate;

pub const FACTORY_ERROR_MESSAGE: &str = "Factories schema validation failed";
pub const EXPORTER_ERROR_MESSAGE: &str = "Exporters schema validation failed";

/// Shared by factories and exporters; only factories carry `exporterId`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePartner {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub exporter_id: Option<String>,
    pub contact: Option<String>,
    #[validate(length(min = 5, max = 32, message = "phone must be 5-32 characters"))]
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PatchPartner {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 5, max = 32, message = "phone must be 5-32 characters"))]
    pub phone: Option<String>,
}
