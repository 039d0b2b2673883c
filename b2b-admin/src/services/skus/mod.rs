pub mod skus_schema;
pub mod skus_service;
pub mod skus_shared;

pub use skus_service::SkusService;
pub use skus_shared::{configure, SERVICE};
