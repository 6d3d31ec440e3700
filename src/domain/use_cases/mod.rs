pub mod compose;
pub mod persistence;
pub mod progress;
pub mod properties;
pub mod submission;
pub mod upload;
