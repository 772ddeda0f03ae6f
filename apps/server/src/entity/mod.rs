//! SeaORM entity definitions.

pub mod generated_site;
pub mod user;
