use serde::Deserialize;
use validator::Validate;

pub const ERROR_MESSAGE: &str = "Departments schema validation failed";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartment {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub parent_id: Option<String>,
    pub sort: Option<i64>,
    pub manager_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PatchDepartment {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    pub parent_id: Option<String>,
    pub sort: Option<i64>,
}
