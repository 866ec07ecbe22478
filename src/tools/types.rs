//! Type definitions for PlatformIO upload MCP tools

use serde::{Deserialize, Serialize};
use schemars::JsonSchema;

use crate::project::BuildRequest;

pub use crate::pio_client::{BuildResult, Stage};

// ============================================================================
// build
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BuildArgs {
    /// PlatformIO environment / board id (e.g., "esp32dev", "seeed_xiao_esp32c3")
    pub board_id: String,
    /// Path to an existing PlatformIO project (omit when sending inline sources)
    #[serde(default)]
    pub project_dir: Option<String>,
    /// Contents of platformio.ini (required if project_dir not provided)
    #[serde(default)]
    pub platformio_ini: Option<String>,
    /// Contents of src/main.cpp (required if project_dir not provided)
    #[serde(default)]
    pub src: Option<String>,
}

impl From<BuildArgs> for BuildRequest {
    fn from(args: BuildArgs) -> Self {
        BuildRequest {
            board_id: args.board_id,
            project_dir: args.project_dir,
            platformio_ini: args.platformio_ini,
            src: args.src,
        }
    }
}

// ============================================================================
// build_upload
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BuildUploadArgs {
    /// PlatformIO environment / board id (e.g., "esp32dev", "uno")
    pub board_id: String,
    /// Path to an existing PlatformIO project (omit when sending inline sources)
    #[serde(default)]
    pub project_dir: Option<String>,
    /// Contents of platformio.ini (required if project_dir not provided)
    #[serde(default)]
    pub platformio_ini: Option<String>,
    /// Contents of src/main.cpp (required if project_dir not provided)
    #[serde(default)]
    pub src: Option<String>,
    /// Serial port for upload (e.g., "/dev/ttyUSB0")
    #[serde(default)]
    pub port: Option<String>,
}

impl BuildUploadArgs {
    pub fn into_parts(self) -> (BuildRequest, Option<String>) {
        let request = BuildRequest {
            board_id: self.board_id,
            project_dir: self.project_dir,
            platformio_ini: self.platformio_ini,
            src: self.src,
        };
        (request, self.port)
    }
}

#[derive(Debug, Serialize)]
pub struct BuildUploadResult {
    pub success: bool,
    pub build: BuildResult,
    /// Absent when the build failed and no upload was attempted
    pub upload: Option<BuildResult>,
}

// ============================================================================
// check_connection_guide
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConnectionGuideArgs {
    /// Board id (e.g., "seeed_xiao_esp32c3")
    pub board_id: String,
    /// Peripheral module (e.g., "BME280", "OLED SSD1306")
    pub module: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PinConnection {
    /// Pin label on the module (e.g., "SDA")
    pub module_pin: String,
    /// Where to connect it on the board (e.g., "GPIO21")
    pub board_pin: String,
}

#[derive(Debug, Serialize)]
pub struct ConnectionGuideResult {
    pub board_id: String,
    pub module: String,
    /// Whether the guide came from the built-in tables
    pub known: bool,
    /// Chip used for the pinout, if the board was recognised
    pub chip: Option<String>,
    /// Bus the module uses (e.g., "i2c", "spi")
    pub bus: Option<String>,
    pub connections: Vec<PinConnection>,
    pub notes: Vec<String>,
    /// Guidance for the assistant when the combination is unknown
    pub hint: Option<String>,
}

// ============================================================================
// list_boards
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListBoardsArgs {}

#[derive(Debug, Serialize, Clone)]
pub struct BoardInfo {
    /// PlatformIO board id
    pub board_id: String,
    pub chip: String,
    pub i2c_sda: String,
    pub i2c_scl: String,
    pub spi_mosi: String,
    pub spi_miso: String,
    pub spi_sck: String,
    pub spi_cs: String,
}

#[derive(Debug, Serialize)]
pub struct ListBoardsResult {
    pub boards: Vec<BoardInfo>,
}
