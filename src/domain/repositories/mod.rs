pub mod asset_store;
pub mod identity_provider;
pub mod user_repository;
