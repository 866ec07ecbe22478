//! RMCP 0.3.2 implementation for PlatformIO build/upload MCP tools
//!
//! Provides 4 tools wrapping `pio run` for building and flashing firmware.

use rmcp::{
    tool, tool_router, tool_handler, ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::*,
    ErrorData as McpError,
    service::RequestContext,
    RoleServer,
};
use serde::Serialize;
use tracing::{debug, error, info};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::types::*;
use crate::config::Config;
use crate::error::UploadError;
use crate::guides;
use crate::pio_client::PioClient;
use crate::project::{BuildRequest, StagedProject};

/// PlatformIO tool handler
#[derive(Clone)]
pub struct PlatformioToolHandler {
    #[allow(dead_code)]
    tool_router: ToolRouter<PlatformioToolHandler>,
    config: Config,
    /// One `pio run` at a time, shared by every clone of the handler
    run_lock: Arc<Mutex<()>>,
}

impl PlatformioToolHandler {
    pub fn new(config: Config) -> Self {
        Self {
            tool_router: Self::tool_router(),
            config,
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Default for PlatformioToolHandler {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Serialize `value` as pretty JSON text content; `is_error` flags a failed pio run
fn json_result<T: Serialize>(value: &T, is_error: bool) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| {
        McpError::internal_error(format!("Serialization error: {}", e), None)
    })?;

    if is_error {
        Ok(CallToolResult::error(vec![Content::text(json)]))
    } else {
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_router]
impl PlatformioToolHandler {
    #[tool(description = "Build a PlatformIO project with 'pio run -e <board_id>'. Pass either project_dir (an existing project containing platformio.ini) or both platformio_ini and src (main.cpp contents) to build in a temporary project.")]
    async fn build(
        &self,
        Parameters(args): Parameters<BuildArgs>,
    ) -> Result<CallToolResult, McpError> {
        let request = BuildRequest::from(args);
        debug!("Building '{}'", request.env());

        let source = request.source()?;

        let _running = self.run_lock.lock().await;
        let project = StagedProject::stage(source)?;
        let client = PioClient::locate(&self.config)?;

        match project.run_stage(&client, request.env(), Stage::Build, None).await {
            Ok(result) => {
                info!("Build for '{}' completed in {}ms", request.env(), result.duration_ms);
                json_result(&result, false)
            }
            Err(UploadError::Subprocess(result)) => {
                error!("Build failed for '{}'", request.env());
                json_result(&*result, true)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[tool(description = "Build and flash a microcontroller using either an existing PlatformIO project (project_dir), or by providing both platformio_ini and main.cpp source code (src). Uploads with 'pio run -t upload' to the given serial port only if the build succeeds.")]
    async fn build_upload(
        &self,
        Parameters(args): Parameters<BuildUploadArgs>,
    ) -> Result<CallToolResult, McpError> {
        let (request, port) = args.into_parts();
        debug!("Build and upload for '{}'", request.env());

        let source = request.source()?;
        let port = self.config.upload_port(port.as_deref());

        let _running = self.run_lock.lock().await;
        let project = StagedProject::stage(source)?;
        let client = PioClient::locate(&self.config)?;

        let build = match project.run_stage(&client, request.env(), Stage::Build, None).await {
            Ok(result) => result,
            Err(UploadError::Subprocess(result)) => {
                error!("Build failed for '{}', skipping upload", request.env());
                let result = BuildUploadResult {
                    success: false,
                    build: *result,
                    upload: None,
                };
                return json_result(&result, true);
            }
            Err(e) => return Err(e.into()),
        };

        match project.run_stage(&client, request.env(), Stage::Upload, Some(&port)).await {
            Ok(upload) => {
                info!("Build & upload for '{}' to {} completed", request.env(), port);
                let result = BuildUploadResult {
                    success: true,
                    build,
                    upload: Some(upload),
                };
                json_result(&result, false)
            }
            Err(UploadError::Subprocess(upload)) => {
                error!("Upload failed for '{}' on {}", request.env(), port);
                let result = BuildUploadResult {
                    success: false,
                    build,
                    upload: Some(*upload),
                };
                json_result(&result, true)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[tool(description = "Given a board_id (e.g., seeed_xiao_esp32c3) and a module (e.g., BME280), return a pin connection guide. If the combination is unknown (known=false), compose a best-effort guide from the board pinout and module datasheet.")]
    async fn check_connection_guide(
        &self,
        Parameters(args): Parameters<ConnectionGuideArgs>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Connection guide for '{}' on '{}'", args.module, args.board_id);

        let guide = guides::connection_guide(&args.board_id, &args.module);

        info!(
            "Connection guide for '{}' on '{}': known={}",
            args.module, args.board_id, guide.known
        );
        json_result(&guide, false)
    }

    #[tool(description = "List ESP32 boards with built-in pinouts (default I2C and SPI pins)")]
    async fn list_boards(
        &self,
        Parameters(_args): Parameters<ListBoardsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let boards = guides::board_infos();

        info!("Listed {} boards", boards.len());
        json_result(&ListBoardsResult { boards }, false)
    }
}


#[tool_handler]
impl ServerHandler for PlatformioToolHandler {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "PlatformIO Upload MCP Server - Build and flash firmware with the pio CLI. \
                 4 tools available: build, build_upload, check_connection_guide, list_boards."
                    .to_string(),
            ),
        }
    }

    async fn initialize(
        &self,
        _request: InitializeRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<InitializeResult, McpError> {
        info!("PlatformIO Upload MCP server initialized with 4 tools");
        Ok(self.get_info())
    }
}
