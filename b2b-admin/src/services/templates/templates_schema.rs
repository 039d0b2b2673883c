use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

pub const ERROR_MESSAGE: &str = "Templates schema validation failed";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Number,
    Select,
    Multiselect,
    Color,
}

/// One attribute of a template with its allowed values.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TemplateField {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub input_type: Option<InputType>,
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTemplate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub fields: Vec<TemplateField>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PatchTemplate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub fields: Vec<TemplateField>,
}
