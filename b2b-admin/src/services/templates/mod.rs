pub mod templates_schema;
pub mod templates_service;
pub mod templates_shared;

pub use templates_service::TemplatesService;
pub use templates_shared::{configure, SERVICE};
