pub mod site_categories_schema;
pub mod site_categories_shared;

pub use site_categories_shared::{configure, SERVICE};
