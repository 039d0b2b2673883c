use serde::Deserialize;
use validator::Validate;

pub const ERROR_MESSAGE: &str = "Site categories schema validation failed";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSiteCategory {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub parent_id: Option<String>,
    pub sort: Option<i64>,
    #[validate(length(min = 1, max = 120, message = "slug must be 1-120 characters"))]
    pub slug: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PatchSiteCategory {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    pub parent_id: Option<String>,
    pub sort: Option<i64>,
    #[validate(length(min = 1, max = 120, message = "slug must be 1-120 characters"))]
    pub slug: Option<String>,
}
