//! PlatformIO Upload MCP Server
//!
//! A Model Context Protocol server that builds and flashes firmware through the
//! PlatformIO CLI. Projects come either from an existing directory or from
//! inline `platformio.ini` + `main.cpp` sources staged in a temp dir.

pub mod config;
pub mod error;
pub mod guides;
pub mod pio_client;
pub mod project;
pub mod tools;

pub use error::{UploadError, Result};
pub use config::Config;
pub use tools::PlatformioToolHandler;
