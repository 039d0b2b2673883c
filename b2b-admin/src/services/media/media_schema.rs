use serde::Deserialize;
use validator::Validate;

pub const ERROR_MESSAGE: &str = "Media schema validation failed";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMedia {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(url(message = "url must be an absolute URL"))]
    pub url: String,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PatchMedia {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(url(message = "url must be an absolute URL"))]
    pub url: Option<String>,
}
