pub mod firebase;
pub mod local;
pub mod memory;
