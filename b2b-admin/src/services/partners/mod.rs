pub mod partners_schema;
pub mod partners_service;
pub mod partners_shared;

pub use partners_service::{PartnerKind, PartnersService};
pub use partners_shared::{configure, EXPORTERS, FACTORIES};
