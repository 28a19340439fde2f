pub mod acquire;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod session;
pub mod view;
