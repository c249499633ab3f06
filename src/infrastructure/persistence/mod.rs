pub mod file_system;
pub mod upload_spool;
