// Application layer - orchestrates domain operations behind the HTTP surface
pub mod dto;
pub mod errors;
pub mod services;
