pub mod sites_schema;
pub mod sites_shared;

pub use sites_shared::{configure, SERVICE};
