//! Configuration for the platformio-upload MCP server

use std::path::PathBuf;
use std::time::Duration;
use clap::Parser;

/// Serial port used for uploads when neither the request nor the CLI names one
pub const DEFAULT_UPLOAD_PORT: &str = "/dev/ttyUSB0";

/// Subprocess timeout applied to every `pio` invocation, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "platformio-upload")]
#[command(about = "MCP server for building and uploading PlatformIO firmware")]
#[command(version)]
pub struct Args {
    /// Path to the pio executable (skips PATH lookup)
    #[arg(long)]
    pub pio_path: Option<PathBuf>,

    /// Default serial port for uploads
    #[arg(long, default_value = DEFAULT_UPLOAD_PORT)]
    pub port: String,

    /// Timeout for each pio invocation in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log file path (defaults to stderr)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone)]
pub struct Config {
    pub pio_path: Option<PathBuf>,
    pub default_port: String,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_args(args: &Args) -> Self {
        Self {
            pio_path: args.pio_path.clone(),
            default_port: args.port.clone(),
            timeout_secs: args.timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Pick the upload port, preferring the per-request override
    pub fn upload_port(&self, override_port: Option<&str>) -> String {
        override_port
            .filter(|p| !p.trim().is_empty())
            .map(|p| p.to_string())
            .unwrap_or_else(|| self.default_port.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pio_path: None,
            default_port: DEFAULT_UPLOAD_PORT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_port_override() {
        let config = Config::default();
        assert_eq!(config.upload_port(Some("/dev/ttyACM0")), "/dev/ttyACM0");
        assert_eq!(config.upload_port(None), DEFAULT_UPLOAD_PORT);
    }

    #[test]
    fn test_upload_port_blank_override_ignored() {
        let config = Config {
            default_port: "/dev/cu.usbserial-1110".to_string(),
            ..Config::default()
        };
        assert_eq!(config.upload_port(Some("  ")), "/dev/cu.usbserial-1110");
    }

    #[test]
    fn test_timeout_duration() {
        let config = Config {
            timeout_secs: 42,
            ..Config::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(42));
    }
}
