pub mod departments_schema;
pub mod departments_shared;

pub use departments_shared::{configure, SERVICE};
