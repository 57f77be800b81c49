#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use otatrack_release::{
    CommitOutcome, CommitRequest, GhCli, GitCommitter, PublishOutcome, ReleaseError,
    ReleaseRequest,
};

/// Fake `gh` that logs its arguments and reports `view` as `view_status`
fn fake_gh(dir: &Path, view_status: i32) -> Result<(PathBuf, PathBuf)> {
    let log = dir.join("gh.log");
    let script = dir.join("gh");
    std::fs::write(
        &script,
        format!(
            "#!/bin/sh\nprintf '%s|' \"$@\" >> '{}'\necho >> '{}'\n\
             if [ \"$2\" = view ]; then exit {view_status}; fi\nexit 0\n",
            log.display(),
            log.display()
        ),
    )?;
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;
    Ok((script, log))
}

fn request() -> ReleaseRequest {
    ReleaseRequest {
        config_name: "km9".to_string(),
        title: "KM9-240215V321".to_string(),
        device: "TECNO KM9".to_string(),
        description: Some("Fixes".to_string()),
        size: Some("1.2 GB".to_string()),
        url: "https://example.com/ota.zip".to_string(),
        fingerprint: "A/B/C:14/T/321:user/release-keys".to_string(),
        metadata: None,
    }
}

#[tokio::test]
async fn creates_missing_release() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (gh, log) = fake_gh(dir.path(), 1)?;

    let outcome = GhCli::with_program(gh).publish(&request()).await?;
    assert_eq!(outcome, PublishOutcome::Created);

    let calls = std::fs::read_to_string(log)?;
    let mut lines = calls.lines();
    assert_eq!(lines.next(), Some("release|view|KM9-240215V321|"));
    let create = lines.next().unwrap_or_default();
    assert!(create.starts_with("release|create|KM9-240215V321|--title|KM9-240215V321|--notes|# TECNO KM9"));
    Ok(())
}

#[tokio::test]
async fn existing_release_is_left_alone() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (gh, log) = fake_gh(dir.path(), 0)?;

    let outcome = GhCli::with_program(gh).publish(&request()).await?;
    assert_eq!(outcome, PublishOutcome::AlreadyExists);
    assert_eq!(std::fs::read_to_string(log)?.lines().count(), 1);
    Ok(())
}

#[tokio::test]
async fn unknown_title_never_runs_gh() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (gh, log) = fake_gh(dir.path(), 1)?;
    let mut request = request();
    request.title = "Unknown Update".to_string();

    let result = GhCli::with_program(gh).publish(&request).await;
    assert!(matches!(result, Err(ReleaseError::MissingField("Title"))));
    assert!(!log.exists());
    Ok(())
}

async fn git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = tokio::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await?;
    anyhow::ensure!(output.status.success(), "git {args:?} failed");
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[tokio::test]
async fn commits_config_and_state() -> Result<()> {
    let Ok(committer) = GitCommitter::locate() else {
        return Ok(());
    };
    let dir = tempfile::tempdir()?;
    let repo = dir.path();
    git(repo, &["init", "-q"]).await?;
    git(repo, &["config", "user.email", "ci@example.com"]).await?;
    git(repo, &["config", "user.name", "CI"]).await?;
    git(repo, &["config", "commit.gpgsign", "false"]).await?;

    std::fs::create_dir(repo.join("devices"))?;
    let config = repo.join("devices/km9.yml");
    std::fs::write(&config, "incremental: a\n")?;
    git(repo, &["add", "."]).await?;
    git(repo, &["commit", "-q", "-m", "init"]).await?;

    std::fs::write(&config, "incremental: b\n")?;
    std::fs::write(repo.join("processed_fingerprints.txt"), "fp\n")?;
    let request = CommitRequest::new(&config, "b")
        .with_variant(Some("Global".to_string()))
        .with_extra_path(repo.join("processed_fingerprints.txt"))
        .with_extra_path(repo.join("missing.txt"));

    let outcome = committer.commit(&request).await?;
    assert_eq!(
        outcome,
        CommitOutcome::Committed("km9 (Global): update incremental to b".to_string())
    );
    assert_eq!(
        git(repo, &["log", "-1", "--format=%s"]).await?,
        "km9 (Global): update incremental to b"
    );
    let files = git(repo, &["show", "--name-only", "--format=", "HEAD"]).await?;
    assert!(files.contains("devices/km9.yml"));
    assert!(files.contains("processed_fingerprints.txt"));

    assert_eq!(committer.commit(&request).await?, CommitOutcome::NothingToCommit);
    Ok(())
}

#[tokio::test]
async fn outside_a_repository() -> Result<()> {
    let Ok(committer) = GitCommitter::locate() else {
        return Ok(());
    };
    let dir = tempfile::tempdir()?;
    let config = dir.path().join("km9.yml");
    std::fs::write(&config, "incremental: a\n")?;
    let result = committer.commit(&CommitRequest::new(&config, "b")).await;
    // a temp dir nested in some checkout would still resolve
    if let Err(e) = result {
        assert!(matches!(e, ReleaseError::NotARepository(_)));
    }
    Ok(())
}
