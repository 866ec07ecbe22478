//! PlatformIO CLI wrapper
//!
//! Shells out to `pio run` rather than linking anything from PlatformIO.
//! Every invocation captures stdout/stderr and is bounded by the configured timeout.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, UploadError};

/// Result of a pio invocation
#[derive(Debug)]
pub struct ExecResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Which `pio run` invocation produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Build,
    Upload,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Build => write!(f, "build"),
            Self::Upload => write!(f, "upload"),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct BuildResult {
    pub success: bool,
    pub stage: Stage,
    /// Process exit code (-1 if terminated by a signal)
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl BuildResult {
    pub fn from_exec(stage: Stage, exec: ExecResult) -> Self {
        Self {
            success: exec.success(),
            stage,
            exit_code: exec.exit_code,
            stdout: exec.stdout,
            stderr: exec.stderr,
            duration_ms: exec.duration.as_millis() as u64,
        }
    }
}

/// Handle to a located `pio` executable
#[derive(Debug, Clone)]
pub struct PioClient {
    program: PathBuf,
    timeout: Duration,
}

impl PioClient {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Find pio from config, PATH, or the PlatformIO installer's default location
    pub fn locate(config: &Config) -> Result<Self> {
        // 1. Config (no fallback: an explicit path that is wrong is an error)
        if let Some(path) = &config.pio_path {
            if path.is_file() {
                return Ok(Self::new(path.clone(), config.timeout()));
            }
            return Err(UploadError::ToolNotFound(format!(
                "--pio-path {} does not exist",
                path.display()
            )));
        }

        // 2. PATH
        for name in ["pio", "platformio"] {
            if let Ok(path) = which::which(name) {
                debug!("Found {} at {}", name, path.display());
                return Ok(Self::new(path, config.timeout()));
            }
        }

        // 3. Installer default (~/.platformio/penv/bin/pio)
        if let Ok(home) = std::env::var("HOME") {
            let candidate = PathBuf::from(home).join(".platformio/penv/bin/pio");
            if candidate.is_file() {
                return Ok(Self::new(candidate, config.timeout()));
            }
        }

        Err(UploadError::ToolNotFound(
            "pio is not on PATH. Install PlatformIO Core or pass --pio-path".to_string(),
        ))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Build the `pio run` argument list for a stage
    pub fn run_args(project_dir: &Path, env: &str, stage: Stage, upload_port: Option<&str>) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "-d".to_string(),
            project_dir.to_string_lossy().to_string(),
            "-e".to_string(),
            env.to_string(),
        ];

        if stage == Stage::Upload {
            args.extend(["-t".to_string(), "upload".to_string()]);
            if let Some(port) = upload_port {
                args.extend(["--upload-port".to_string(), port.to_string()]);
            }
        }

        args
    }

    /// Run `pio run` for one stage in the given project directory
    pub async fn run(
        &self,
        project_dir: &Path,
        env: &str,
        stage: Stage,
        upload_port: Option<&str>,
    ) -> Result<ExecResult> {
        let args = Self::run_args(project_dir, env, stage, upload_port);
        info!("{}: {} {}", stage.to_string().to_uppercase(), self.program.display(), args.join(" "));

        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .current_dir(project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(UploadError::ToolNotFound(format!(
                    "{}: {}",
                    self.program.display(),
                    e
                )));
            }
            Ok(Err(e)) => return Err(UploadError::IoError(e)),
            Err(_) => {
                warn!("pio {} exceeded {:?}, killed", stage, self.timeout);
                return Err(UploadError::Timeout {
                    stage,
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let result = ExecResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration: start.elapsed(),
        };

        debug!("pio {} exited with {} in {:?}", stage, result.exit_code, result.duration);
        Ok(result)
    }
}


#[cfg(all(test, unix))]
mod tests {
    use super::test_support::write_fake_pio;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_args_build() {
        let args = PioClient::run_args(Path::new("/tmp/proj"), "esp32dev", Stage::Build, Some("/dev/ttyUSB0"));
        assert_eq!(args, ["run", "-d", "/tmp/proj", "-e", "esp32dev"]);
    }

    #[test]
    fn test_run_args_upload() {
        let args = PioClient::run_args(Path::new("/tmp/proj"), "esp32dev", Stage::Upload, Some("/dev/ttyUSB0"));
        assert_eq!(
            args,
            ["run", "-d", "/tmp/proj", "-e", "esp32dev", "-t", "upload", "--upload-port", "/dev/ttyUSB0"]
        );
    }

    #[test]
    fn test_build_result_from_failed_exec() {
        let exec = ExecResult {
            exit_code: 1,
            stdout: "Processing esp32dev".to_string(),
            stderr: "Error: compilation failed".to_string(),
            duration: Duration::from_millis(1500),
        };
        let result = BuildResult::from_exec(Stage::Upload, exec);

        assert!(!result.success);
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.duration_ms, 1500);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["stage"], "upload");
        assert_eq!(json["stderr"], "Error: compilation failed");
    }

    #[test]
    fn test_locate_explicit_missing_path() {
        let config = Config {
            pio_path: Some("/nonexistent/bin/pio".into()),
            ..Config::default()
        };
        let err = PioClient::locate(&config).unwrap_err();
        assert!(matches!(err, UploadError::ToolNotFound(_)));
    }

    #[test]
    fn test_locate_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let pio = write_fake_pio(tmp.path());
        let config = Config {
            pio_path: Some(pio.clone()),
            ..Config::default()
        };
        let client = PioClient::locate(&config).unwrap();
        assert_eq!(client.program(), pio.as_path());
    }

    #[tokio::test]
    async fn test_run_success_captures_stdout() {
        let tmp = TempDir::new().unwrap();
        let pio = write_fake_pio(tmp.path());
        let client = PioClient::new(pio, Duration::from_secs(30));

        let result = client.run(tmp.path(), "esp32dev", Stage::Build, None).await.unwrap();
        assert!(result.success());
        assert!(result.stdout.contains("-e esp32dev"));
        assert!(result.stderr.is_empty());
    }

    #[tokio::test]
    async fn test_run_unknown_env_fails() {
        let tmp = TempDir::new().unwrap();
        let pio = write_fake_pio(tmp.path());
        let client = PioClient::new(pio, Duration::from_secs(30));

        let result = client.run(tmp.path(), "nosuchboard", Stage::Build, None).await.unwrap();
        assert_eq!(result.exit_code, 1);
        assert!(result.stderr.contains("Unknown environment"));
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let tmp = TempDir::new().unwrap();
        let client = PioClient::new(tmp.path().join("no-such-pio"), Duration::from_secs(30));

        let err = client.run(tmp.path(), "esp32dev", Stage::Build, None).await.unwrap_err();
        assert!(matches!(err, UploadError::ToolNotFound(_)));
    }

    #[tokio::test]
    async fn test_run_timeout() {
        let tmp = TempDir::new().unwrap();
        let pio = write_fake_pio(tmp.path());
        let client = PioClient::new(pio, Duration::from_secs(1));

        let err = client.run(tmp.path(), "slowboard", Stage::Build, None).await.unwrap_err();
        assert!(matches!(err, UploadError::Timeout { stage: Stage::Build, seconds: 1 }));
    }
}
