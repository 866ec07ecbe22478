//! PlatformIO Upload MCP Server

use clap::Parser;
use tracing::{info, error, debug};
use tracing_subscriber::{EnvFilter, fmt};
use rmcp::{ServiceExt, transport::stdio};

use platformio_upload::{Config, config::Args, tools::PlatformioToolHandler};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    info!("Starting PlatformIO Upload MCP Server v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_args(&args);
    debug!("pio timeout {}s, default port {}", config.timeout_secs, config.default_port);

    let service = PlatformioToolHandler::new(config)
        .serve(stdio()).await.inspect_err(|e| {
            error!("Serving error: {:?}", e);
        })?;

    service.waiting().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use platformio_upload::config::{Args, Config, DEFAULT_TIMEOUT_SECS, DEFAULT_UPLOAD_PORT};

    #[test]
    fn test_args_parsing_defaults() {
        let args = Args::parse_from(["platformio-upload"]);
        assert!(args.pio_path.is_none());
        assert_eq!(args.port, DEFAULT_UPLOAD_PORT);
        assert_eq!(args.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(args.log_level, "info");
        assert!(args.log_file.is_none());
    }

    #[test]
    fn test_args_parsing_overrides() {
        let args = Args::parse_from([
            "platformio-upload",
            "--pio-path", "/opt/pio/bin/pio",
            "--port", "/dev/ttyACM0",
            "--timeout", "600",
            "--log-level", "debug",
        ]);
        assert_eq!(args.pio_path.unwrap().to_str().unwrap(), "/opt/pio/bin/pio");
        assert_eq!(args.port, "/dev/ttyACM0");
        assert_eq!(args.timeout, 600);
        assert_eq!(args.log_level, "debug");
    }

    #[test]
    fn test_config_from_args() {
        let args = Args::parse_from(["platformio-upload", "--timeout", "30"]);
        let config = Config::from_args(&args);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.default_port, DEFAULT_UPLOAD_PORT);
    }
}

fn init_logging(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(false)
        .with_line_number(false);

    if let Some(log_file) = &args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)?;
        subscriber.with_writer(file).init();
    } else {
        subscriber.with_writer(std::io::stderr).init();
    }

    debug!("Logging initialized with level: {}", args.log_level);
    Ok(())
}
