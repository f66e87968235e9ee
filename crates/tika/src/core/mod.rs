//! Core configuration shared by the server launcher and the CLI.

pub mod config;

pub use config::ServerConfig;
