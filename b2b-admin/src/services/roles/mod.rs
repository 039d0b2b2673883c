pub mod roles_schema;
pub mod roles_shared;

pub use roles_shared::{configure, SERVICE};
