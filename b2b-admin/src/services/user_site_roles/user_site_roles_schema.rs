use serde::Deserialize;
use validator::Validate;

pub const ERROR_MESSAGE: &str = "User site roles schema validation failed";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub site_id: Option<String>,
    #[validate(length(min = 1, message = "roleId must not be empty"))]
    pub role_id: String,
}

/// Body of `POST /user-site-roles/assign`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoles {
    #[validate(length(min = 1, message = "userId must not be empty"))]
    pub user_id: String,
    #[validate(nested)]
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserSiteRole {
    #[validate(length(min = 1, message = "userId must not be empty"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "roleId must not be empty"))]
    pub role_id: String,
    pub site_id: Option<String>,
}
