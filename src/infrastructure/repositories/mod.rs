pub mod file_user_repository;
