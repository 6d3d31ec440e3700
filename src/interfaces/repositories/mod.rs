pub mod admin;
pub mod property;
pub mod sqlx_repo;
pub mod storage;
