use serde::Deserialize;
use validator::Validate;

pub const ERROR_MESSAGE: &str = "Sites schema validation failed";

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteKind {
    Factory,
    Exporter,
    Group,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    Active,
    Disabled,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSite {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub kind: SiteKind,
    #[validate(length(min = 3, message = "domain is too short"))]
    pub domain: Option<String>,
    pub factory_id: Option<String>,
    pub exporter_id: Option<String>,
    pub status: Option<SiteStatus>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PatchSite {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    pub kind: Option<SiteKind>,
    #[validate(length(min = 3, message = "domain is too short"))]
    pub domain: Option<String>,
    pub status: Option<SiteStatus>,
}
