use serde::Deserialize;
use validator::Validate;

pub const ERROR_MESSAGE: &str = "Roles schema validation failed";

/// `permissions` holds tags such as `products:create` or `products:*`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRole {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, max = 64, message = "code must be 1-64 characters"))]
    pub code: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PatchRole {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 64, message = "code must be 1-64 characters"))]
    pub code: Option<String>,
    pub permissions: Option<Vec<String>>,
}
