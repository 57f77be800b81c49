//! Auto-commit of rewritten config files

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::ReleaseError;
use crate::process::{DEFAULT_TOOL_TIMEOUT, locate, run_tool};

/// Files to commit after an incremental bump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    /// Rewritten config file
    pub config_path: PathBuf,
    /// New incremental value
    pub value: String,
    /// Variant label for the message scope
    pub variant_label: Option<String>,
    /// Further files to stage when they exist, such as the state file
    pub extra_paths: Vec<PathBuf>,
}

impl CommitRequest {
    /// Commit of `config_path` bumped to `value`
    pub fn new(config_path: impl Into<PathBuf>, value: impl Into<String>) -> Self {
        Self {
            config_path: config_path.into(),
            value: value.into(),
            variant_label: None,
            extra_paths: Vec::new(),
        }
    }

    /// Name the variant in the message scope
    pub fn with_variant(mut self, label: Option<String>) -> Self {
        self.variant_label = label.filter(|l| !l.trim().is_empty());
        self
    }

    /// Also stage `path` if it exists
    pub fn with_extra_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.extra_paths.push(path.into());
        self
    }

    /// `{stem} ({variant}): update incremental to {value}`
    pub fn message(&self) -> String {
        let stem = self
            .config_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match &self.variant_label {
            Some(label) => format!("{stem} ({label}): update incremental to {}", self.value),
            None => format!("{stem}: update incremental to {}", self.value),
        }
    }
}

/// Result of a commit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A commit was made with this message
    Committed(String),
    /// Staging produced no changes
    NothingToCommit,
}

/// `git` invoker
#[derive(Debug, Clone)]
pub struct GitCommitter {
    program: PathBuf,
    timeout: Duration,
}

impl GitCommitter {
    /// Use the `git` found on `PATH`
    pub fn locate() -> Result<Self, ReleaseError> {
        Ok(Self::with_program(locate("git")?))
    }

    /// Use a specific executable
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Override the per-invocation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Stage the request's files and commit them
    pub async fn commit(&self, request: &CommitRequest) -> Result<CommitOutcome, ReleaseError> {
        let config_dir = request
            .config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        let toplevel = self
            .git(["rev-parse", "--show-toplevel"], config_dir)
            .await?;
        if !toplevel.success() {
            let reason = toplevel.stderr.trim();
            return Err(ReleaseError::NotARepository(if reason.is_empty() {
                "Unknown error".to_string()
            } else {
                reason.to_string()
            }));
        }
        let root_text = toplevel.stdout.trim();
        let root = PathBuf::from(if root_text.is_empty() { "." } else { root_text });
        let root = tokio::fs::canonicalize(&root).await.unwrap_or(root);

        let paths = stage_paths(request, &root).await;
        debug!(root = %root.display(), paths = ?paths, "staging files");

        let mut add = vec!["add".to_string(), "--".to_string()];
        add.extend(paths);
        let added = self.git(&add, &root).await?;
        if !added.success() {
            return Err(added.into_failure("git add"));
        }

        let diff = self.git(["diff", "--cached", "--quiet"], &root).await?;
        match diff.status {
            Some(0) => {
                info!(config = %request.config_path.display(), "nothing staged, skipping commit");
                return Ok(CommitOutcome::NothingToCommit);
            }
            Some(1) => {}
            _ => return Err(diff.into_failure("git diff --cached --quiet")),
        }

        let message = request.message();
        let committed = self
            .git(["commit", "-m", message.as_str()], &root)
            .await?;
        if !committed.success() {
            return Err(committed.into_failure("git commit"));
        }
        info!(message = %message, "committed incremental update");
        Ok(CommitOutcome::Committed(message))
    }

    async fn git<I, S>(&self, args: I, cwd: &Path) -> Result<crate::ToolOutput, ReleaseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        run_tool(&self.program, args, Some(cwd), self.timeout).await
    }
}

/// Config plus existing extra paths, resolved, deduplicated and made root-relative
async fn stage_paths(request: &CommitRequest, root: &Path) -> Vec<String> {
    let mut candidates = vec![request.config_path.clone()];
    for extra in &request.extra_paths {
        if tokio::fs::try_exists(extra).await.unwrap_or(false) {
            candidates.push(extra.clone());
        }
    }

    let mut seen = HashSet::new();
    let mut paths = Vec::new();
    for path in candidates {
        let resolved = tokio::fs::canonicalize(&path).await.unwrap_or(path);
        if !seen.insert(resolved.clone()) {
            continue;
        }
        let relative = resolved.strip_prefix(root).unwrap_or(&resolved);
        paths.push(relative.to_string_lossy().into_owned());
    }
    paths
}
