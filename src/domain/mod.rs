// Domain layer - entities and the interfaces the rest of the crate depends on
pub mod errors;
pub mod models;
pub mod repositories;
