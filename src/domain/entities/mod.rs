pub mod admin;
pub mod property;
pub mod submission;
pub mod upload;
