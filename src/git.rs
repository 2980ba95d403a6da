use std::path::Path;
use std::process::{Command, Stdio};
use log::debug;

use crate::error::{TimError, TimResult};

/// Glob passed to `git tag --list` for release tags
pub const VERSION_TAG_PATTERN: &str = "v*";

/// Name of the remote created by `git clone`
pub const DEFAULT_REMOTE: &str = "origin";

/// Runs version control subcommands against a working directory.
///
/// Implementations return the command's standard output with surrounding
/// whitespace trimmed. Standard error is not captured.
pub trait GitGateway: Send + Sync {
    fn run(&self, dir: &Path, args: &[&str]) -> TimResult<String>;
}

/// Gateway backed by the `git` executable
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl GitCli {
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Use a different executable, e.g. an absolute path to git
    pub fn with_program<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitGateway for GitCli {
    fn run(&self, dir: &Path, args: &[&str]) -> TimResult<String> {
        let command = args.join(" ");
        debug!("Running {} {} in {}", self.program, command, dir.display());

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| TimError::GitSpawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(TimError::Git {
                command,
                dir: dir.to_path_buf(),
                status: output.status,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Fetch remote refs together with all tags
pub fn fetch_tags(git: &dyn GitGateway, dir: &Path) -> TimResult<()> {
    git.run(dir, &["fetch", "--tags"]).map(|_| ())
}

/// List local tags that follow the release tag convention, unfiltered
pub fn list_version_tags(git: &dyn GitGateway, dir: &Path) -> TimResult<Vec<String>> {
    let output = git.run(dir, &["tag", "--list", VERSION_TAG_PATTERN])?;
    Ok(output.lines().map(str::to_string).collect())
}

/// Branch the remote's HEAD points at, without the remote prefix
pub fn default_branch(git: &dyn GitGateway, dir: &Path) -> TimResult<String> {
    let remote_head = format!("{}/HEAD", DEFAULT_REMOTE);
    let reference = rev_parse(git, dir, "--abbrev-ref", &remote_head)?;
    let prefix = format!("{}/", DEFAULT_REMOTE);

    Ok(reference
        .strip_prefix(&prefix)
        .unwrap_or(&reference)
        .to_string())
}

/// Short commit id of the given revision
pub fn short_hash(git: &dyn GitGateway, dir: &Path, revision: &str) -> TimResult<String> {
    rev_parse(git, dir, "--short", revision)
}

/// Short commit id of the branch's upstream tracking ref.
/// Fails when no upstream is configured for the branch.
pub fn upstream_hash(git: &dyn GitGateway, dir: &Path, branch: &str) -> TimResult<String> {
    short_hash(git, dir, &format!("{}@{{upstream}}", branch))
}

pub fn rev_parse(git: &dyn GitGateway, dir: &Path, flag: &str, revision: &str) -> TimResult<String> {
    git.run(dir, &["rev-parse", flag, revision])
}

/// Check out a branch or tag
pub fn checkout(git: &dyn GitGateway, dir: &Path, reference: &str) -> TimResult<()> {
    git.run(dir, &["checkout", "-q", reference]).map(|_| ())
}

/// Check out `branch` and fast-forward it to its upstream.
///
/// A plain checkout leaves an existing local branch where it was, so the
/// pull is needed to move the local ref to the remote tip.
pub fn update_branch(git: &dyn GitGateway, dir: &Path, branch: &str) -> TimResult<()> {
    git.run(dir, &["checkout", "-f", "-q", branch])?;
    git.run(dir, &["pull", "--ff-only", "-q"]).map(|_| ())
}

/// Clone `url` into `dir`, which must exist and be empty
pub fn clone_into(git: &dyn GitGateway, dir: &Path, url: &str) -> TimResult<()> {
    git.run(dir, &["clone", url, "."]).map(|_| ())
}
