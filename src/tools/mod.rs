//! PlatformIO upload MCP tools module
//!
//! This module provides a unified tool handler for PlatformIO build and upload
//! operations using the RMCP 0.3.2 API patterns.

pub mod types;
pub mod upload_tools;

pub use types::*;
pub use upload_tools::*;
