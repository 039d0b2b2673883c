use serde::Deserialize;
use validator::Validate;

pub const ERROR_MESSAGE: &str = "Inquiries schema validation failed";

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    New,
    Processing,
    Closed,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInquiry {
    pub product_id: Option<String>,
    #[validate(length(min = 1, message = "contactName must not be empty"))]
    pub contact_name: String,
    #[validate(email(message = "email is not a valid address"))]
    pub email: String,
    pub company: Option<String>,
    #[validate(length(max = 5000, message = "message is too long"))]
    pub message: Option<String>,
    pub status: Option<InquiryStatus>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PatchInquiry {
    #[validate(length(min = 1, message = "contactName must not be empty"))]
    pub contact_name: Option<String>,
    #[validate(email(message = "email is not a valid address"))]
    pub email: Option<String>,
    pub status: Option<InquiryStatus>,
}
