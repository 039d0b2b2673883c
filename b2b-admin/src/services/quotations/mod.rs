pub mod quotations_schema;
pub mod quotations_shared;

pub use quotations_shared::{configure, SERVICE};
