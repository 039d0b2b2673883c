pub mod media_links;
pub mod media_schema;
pub mod media_shared;

pub use media_links::MediaLinks;
pub use media_shared::{configure, SERVICE};
