pub mod cache;
pub mod config;
pub mod core;
pub mod error;
pub mod persistence;
pub mod scheduler;
pub mod state;
