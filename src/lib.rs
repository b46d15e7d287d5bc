pub mod config;
pub mod errors;
pub mod export;
pub mod lanes;
pub mod records;
pub mod timeline;
