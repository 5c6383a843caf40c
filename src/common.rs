pub mod collections;
pub mod config;
