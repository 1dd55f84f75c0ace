pub mod config;
pub mod error;
pub mod plate_detection;
pub mod scanner;

pub use error::ScannerError;
