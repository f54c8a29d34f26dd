pub mod cors;
pub mod db;
pub mod imaging;
pub mod storage;
pub mod telemetry;
pub mod utils;
