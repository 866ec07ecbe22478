//! Project staging
//!
//! Turns a validated request into a directory `pio` can run in, either the
//! caller's existing project or a throwaway one written from inline sources.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{info, warn};

use crate::error::{Result, UploadError};
use crate::pio_client::{BuildResult, PioClient, Stage};

/// A build request as received from the caller, before validation
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    pub board_id: String,
    pub project_dir: Option<String>,
    pub platformio_ini: Option<String>,
    pub src: Option<String>,
}

/// Where the project comes from once the request has been validated
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectSource {
    Directory(String),
    Inline { platformio_ini: String, src: String },
}

impl BuildRequest {
    /// Check the request shape: a usable board id, and exactly one of
    /// `project_dir` or the inline `platformio_ini` + `src` pair.
    pub fn source(&self) -> Result<ProjectSource> {
        let board = self.board_id.trim();
        if board.is_empty() {
            return Err(UploadError::Validation("board_id must not be empty".to_string()));
        }
        if board.chars().any(char::is_whitespace) {
            return Err(UploadError::Validation(format!(
                "board_id '{}' must not contain whitespace",
                self.board_id
            )));
        }

        let project_dir = non_blank(self.project_dir.as_deref());
        let platformio_ini = non_blank(self.platformio_ini.as_deref());
        let src = non_blank(self.src.as_deref());

        match (project_dir, platformio_ini, src) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(UploadError::Validation(
                "Provide either project_dir or inline platformio_ini/src, not both".to_string(),
            )),
            (Some(dir), None, None) => Ok(ProjectSource::Directory(dir.to_string())),
            (None, Some(ini), Some(src)) => Ok(ProjectSource::Inline {
                platformio_ini: ini.to_string(),
                src: src.to_string(),
            }),
            (None, _, _) => Err(UploadError::Validation(
                "Either project_dir or both platformio_ini and src must be provided".to_string(),
            )),
        }
    }

    pub fn env(&self) -> &str {
        self.board_id.trim()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// A project directory ready for `pio run`.
///
/// Inline projects own their temp dir; it is deleted when this value drops.
#[derive(Debug)]
pub struct StagedProject {
    path: PathBuf,
    temp: Option<TempDir>,
}

impl StagedProject {
    pub fn stage(source: ProjectSource) -> Result<Self> {
        match source {
            ProjectSource::Directory(dir) => Self::existing(&dir),
            ProjectSource::Inline { platformio_ini, src } => Self::inline(&platformio_ini, &src),
        }
    }

    fn existing(dir: &str) -> Result<Self> {
        let expanded = expand_home(dir);
        let path = expanded.canonicalize().map_err(|_| {
            UploadError::ProjectNotFound(format!("{} does not exist", expanded.display()))
        })?;

        if !path.join("platformio.ini").is_file() {
            return Err(UploadError::ProjectNotFound(format!(
                "platformio.ini not found in: {}",
                path.display()
            )));
        }

        Ok(Self { path, temp: None })
    }

    fn inline(platformio_ini: &str, src: &str) -> Result<Self> {
        let temp = tempfile::Builder::new().prefix("pio-upload-").tempdir()?;
        let path = temp.path().to_path_buf();

        fs::create_dir_all(path.join("src"))?;
        fs::write(path.join("platformio.ini"), platformio_ini)?;
        fs::write(path.join("src").join("main.cpp"), src)?;

        info!("Temporary project created at: {}", path.display());
        Ok(Self { path, temp: Some(temp) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }

    /// Run `pio run` for `env`; a non-zero exit becomes `UploadError::Subprocess`
    pub async fn run_stage(
        &self,
        client: &PioClient,
        env: &str,
        stage: Stage,
        upload_port: Option<&str>,
    ) -> Result<BuildResult> {
        let exec = client.run(&self.path, env, stage, upload_port).await?;
        let result = BuildResult::from_exec(stage, exec);

        if result.success {
            Ok(result)
        } else {
            warn!("pio {} for '{}' failed with exit code {}", stage, env, result.exit_code);
            Err(UploadError::Subprocess(Box::new(result)))
        }
    }
}

/// Expand a leading `~` to $HOME
fn expand_home(path: &str) -> PathBuf {
    if path == "~" || path.starts_with("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(path.trim_start_matches('~').trim_start_matches('/'));
        }
    }
    PathBuf::from(path)
}
