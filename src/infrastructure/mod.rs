pub mod db;
pub mod imaging;
pub mod storage;
pub mod utils;
