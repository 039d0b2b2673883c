pub mod inquiries_schema;
pub mod inquiries_shared;

pub use inquiries_shared::{configure, SERVICE};
