//! GitHub releases through the `gh` CLI

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::error::ReleaseError;
use crate::notes::ReleaseRequest;
use crate::process::{DEFAULT_TOOL_TIMEOUT, locate, run_tool};

/// Result of a publish attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A new release was created
    Created,
    /// A release with this tag already existed
    AlreadyExists,
}

/// `gh` invoker
#[derive(Debug, Clone)]
pub struct GhCli {
    program: PathBuf,
    working_dir: Option<PathBuf>,
    timeout: Duration,
}

impl GhCli {
    /// Use the `gh` found on `PATH`
    pub fn locate() -> Result<Self, ReleaseError> {
        Ok(Self::with_program(locate("gh")?))
    }

    /// Use a specific executable
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            working_dir: None,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Run `gh` from `dir`, which selects the repository
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Override the per-invocation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Executable in use
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Create the release for `request` unless its tag already exists
    pub async fn publish(&self, request: &ReleaseRequest) -> Result<PublishOutcome, ReleaseError> {
        request.validate()?;
        let title = request.title.as_str();

        let view = run_tool(
            &self.program,
            ["release", "view", title],
            self.working_dir.as_deref(),
            self.timeout,
        )
        .await?;
        if view.success() {
            info!(title, config = %request.config_name, "release already exists");
            return Ok(PublishOutcome::AlreadyExists);
        }

        let notes = request.notes();
        let create = run_tool(
            &self.program,
            ["release", "create", title, "--title", title, "--notes", notes.as_str()],
            self.working_dir.as_deref(),
            self.timeout,
        )
        .await?;
        if !create.success() {
            return Err(create.into_failure(format!("gh release create {title}")));
        }

        info!(title, config = %request.config_name, "created release");
        Ok(PublishOutcome::Created)
    }
}
