pub mod config;
pub mod persistence;
