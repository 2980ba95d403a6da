//! Plugin versions
//!
//! A plugin is either pinned to a release tag, which is immutable and
//! ordered, or tracks a branch, which moves and is only compared by commit
//! id. Both are checked against the remote and upgraded through the git
//! gateway. An upgrade always produces a new `Version`; the checked value is
//! left as it was.

pub mod resolver;
pub mod semver;

use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use log::debug;

use crate::error::{TimError, TimResult};
use crate::git::{self, GitGateway};

pub use resolver::{find_best_version, version_from_spec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Version {
    Tag(TagVersion),
    Branch(BranchVersion),
}

impl Version {
    /// Parse a lockfile spec. Blank specs carry no version.
    pub fn from_spec(spec: &str) -> Option<Self> {
        version_from_spec(spec)
    }

    /// Query the remote for the newest available version, recording it
    /// alongside the current one.
    pub fn check(&mut self, git: &dyn GitGateway, dir: &Path) -> TimResult<()> {
        match self {
            Version::Tag(tag) => tag.check(git, dir),
            Version::Branch(branch) => branch.check(git, dir),
        }
    }

    /// The version to move to, if the last check found a newer one
    pub fn has_upgrade(&self) -> Option<Version> {
        match self {
            Version::Tag(tag) => tag.has_upgrade().map(Version::Tag),
            Version::Branch(branch) => branch.has_upgrade().map(Version::Branch),
        }
    }

    /// Move the checkout in `dir` to this version
    pub fn upgrade(&self, git: &dyn GitGateway, dir: &Path) -> TimResult<()> {
        match self {
            Version::Tag(tag) => tag.upgrade(git, dir),
            Version::Branch(branch) => branch.upgrade(git, dir),
        }
    }

    /// The git ref to check out, which is also the spec written to the lockfile
    pub fn git_ref(&self) -> &str {
        match self {
            Version::Tag(tag) => tag.current(),
            Version::Branch(branch) => branch.branch(),
        }
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, Version::Tag(_))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Tag(tag) => write!(f, "{}", tag.current()),
            Version::Branch(branch) if branch.current_hash().is_empty() => {
                write!(f, "{}", branch.branch())
            }
            Version::Branch(branch) => write!(f, "{}@{}", branch.branch(), branch.current_hash()),
        }
    }
}

/// A version pinned to a release tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagVersion {
    current: String,
    latest: Option<String>,
}

impl TagVersion {
    /// Pin to `tag`, which must already be a valid version tag
    pub(crate) fn pinned<S: Into<String>>(tag: S) -> Self {
        Self {
            current: tag.into(),
            latest: None,
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn latest(&self) -> Option<&str> {
        self.latest.as_deref()
    }

    /// Fetch tags and record the greatest one as `latest`.
    ///
    /// Fails with `NoVersionsAvailable` when the remote has no valid
    /// version tags. `latest` never drops below `current`.
    pub fn check(&mut self, git: &dyn GitGateway, dir: &Path) -> TimResult<()> {
        git::fetch_tags(git, dir)?;
        let tags = git::list_version_tags(git, dir)?;

        let newest = semver::max_version(&tags);
        if newest.is_empty() {
            return Err(TimError::NoVersionsAvailable);
        }

        debug!("Newest tag in {} is {} (current {})", dir.display(), newest, self.current);
        self.latest = Some(if semver::compare(&newest, &self.current) == Ordering::Greater {
            newest
        } else {
            self.current.clone()
        });
        Ok(())
    }

    pub fn has_upgrade(&self) -> Option<TagVersion> {
        let latest = self.latest.as_deref().filter(|latest| !latest.is_empty())?;
        if semver::compare(latest, &self.current) == Ordering::Greater {
            Some(TagVersion::pinned(latest))
        } else {
            None
        }
    }

    pub fn upgrade(&self, git: &dyn GitGateway, dir: &Path) -> TimResult<()> {
        git::checkout(git, dir, &self.current)
    }
}

/// A version tracking the head of a branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchVersion {
    branch: String,
    current_hash: String,
    latest_hash: Option<String>,
}

impl BranchVersion {
    /// Track `branch` without a resolved commit
    pub fn tracking<S: Into<String>>(branch: S) -> Self {
        Self::at(branch, String::new())
    }

    /// Track `branch`, currently at commit `hash`
    pub fn at<B: Into<String>, H: Into<String>>(branch: B, hash: H) -> Self {
        Self {
            branch: branch.into(),
            current_hash: hash.into(),
            latest_hash: None,
        }
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn current_hash(&self) -> &str {
        &self.current_hash
    }

    /// Fetch and record the upstream tip as `latest_hash`.
    ///
    /// An unresolved `current_hash` is filled in from the local branch first,
    /// which is the case for versions read back from the lockfile.
    pub fn check(&mut self, git: &dyn GitGateway, dir: &Path) -> TimResult<()> {
        git::fetch_tags(git, dir)?;

        if self.current_hash.is_empty() {
            self.current_hash = git::short_hash(git, dir, &self.branch)?;
        }
        let upstream = git::upstream_hash(git, dir, &self.branch)?;

        debug!("Upstream of {} in {} is at {} (current {})", self.branch, dir.display(), upstream, self.current_hash);
        self.latest_hash = Some(upstream);
        Ok(())
    }

    pub fn has_upgrade(&self) -> Option<BranchVersion> {
        let latest = self.latest_hash.as_deref()?;
        if self.current_hash.is_empty() || latest.is_empty() || latest == self.current_hash {
            return None;
        }
        Some(BranchVersion::at(self.branch.clone(), latest))
    }

    pub fn upgrade(&self, git: &dyn GitGateway, dir: &Path) -> TimResult<()> {
        git::update_branch(git, dir, &self.branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::testing::ScriptedGit;
    use std::path::PathBuf;

    fn plugin_dir() -> PathBuf {
        PathBuf::from("/plugins/acme/widgets")
    }

    fn tags_remote(tags: &str) -> ScriptedGit {
        let git = ScriptedGit::new();
        git.respond(&plugin_dir(), "fetch --tags", "")
            .respond(&plugin_dir(), "tag --list v*", tags);
        git
    }

    #[test]
    fn test_no_upgrade_before_check() {
        let tag = Version::from_spec("v1.0.0").unwrap();
        assert!(tag.has_upgrade().is_none());

        let branch = Version::Branch(BranchVersion::at("main", "abc1234"));
        assert!(branch.has_upgrade().is_none());
    }

    #[test]
    fn test_tag_check_finds_newer_tag() {
        let git = tags_remote("v0.9.0\nv1.0.0\nv1.2.0\nnightly");
        let mut version = Version::from_spec("v1.0.0").unwrap();

        version.check(&git, &plugin_dir()).unwrap();
        let target = version.has_upgrade().expect("upgrade expected");

        assert_eq!(target.git_ref(), "v1.2.0");
        assert_eq!(version.git_ref(), "v1.0.0", "check must not move current");
    }

    #[test]
    fn test_tag_check_is_stable() {
        let git = tags_remote("v1.0.0\nv1.2.0");
        let mut version = Version::from_spec("v1.0.0").unwrap();

        version.check(&git, &plugin_dir()).unwrap();
        let first = version.has_upgrade();
        version.check(&git, &plugin_dir()).unwrap();
        assert_eq!(version.has_upgrade(), first);
    }

    #[test]
    fn test_tag_check_never_downgrades() {
        let git = tags_remote("v1.0.0\nv1.1.0");
        let mut version = TagVersion::pinned("v2.0.0");

        version.check(&git, &plugin_dir()).unwrap();
        assert_eq!(version.latest(), Some("v2.0.0"));
        assert!(version.has_upgrade().is_none());
    }

    #[test]
    fn test_tag_check_without_tags() {
        let git = tags_remote("nightly\nlatest");
        let mut version = Version::from_spec("v1.0.0").unwrap();

        let err = version.check(&git, &plugin_dir()).unwrap_err();
        assert!(matches!(err, TimError::NoVersionsAvailable));
    }

    #[test]
    fn test_tag_upgrade_checks_out_target() {
        let git = ScriptedGit::new();
        git.respond(&plugin_dir(), "checkout -q v1.2.0", "");

        Version::Tag(TagVersion::pinned("v1.2.0"))
            .upgrade(&git, &plugin_dir())
            .unwrap();
        assert_eq!(git.calls_in(&plugin_dir()), vec!["checkout -q v1.2.0"]);
    }

    #[test]
    fn test_branch_check_detects_new_commits() {
        let git = ScriptedGit::new();
        git.respond(&plugin_dir(), "fetch --tags", "")
            .respond(&plugin_dir(), "rev-parse --short main@{upstream}", "def5678");

        let mut version = Version::Branch(BranchVersion::at("main", "abc1234"));
        version.check(&git, &plugin_dir()).unwrap();

        let target = version.has_upgrade().expect("upgrade expected");
        assert_eq!(target.to_string(), "main@def5678");
        assert_eq!(target.git_ref(), "main");
    }

    #[test]
    fn test_branch_check_resolves_missing_hash() {
        let git = ScriptedGit::new();
        git.respond(&plugin_dir(), "fetch --tags", "")
            .respond(&plugin_dir(), "rev-parse --short main", "abc1234")
            .respond(&plugin_dir(), "rev-parse --short main@{upstream}", "abc1234");

        let mut version = Version::from_spec("main").unwrap();
        version.check(&git, &plugin_dir()).unwrap();

        assert_eq!(version.to_string(), "main@abc1234");
        assert!(version.has_upgrade().is_none());
    }

    #[test]
    fn test_branch_check_without_upstream_fails() {
        let git = ScriptedGit::new();
        git.respond(&plugin_dir(), "fetch --tags", "")
            .fail(&plugin_dir(), "rev-parse --short main@{upstream}");

        let mut version = Version::Branch(BranchVersion::at("main", "abc1234"));
        assert!(version.check(&git, &plugin_dir()).is_err());
        assert!(version.has_upgrade().is_none());
    }

    #[test]
    fn test_branch_upgrade_fast_forwards() {
        let git = ScriptedGit::new();
        git.respond(&plugin_dir(), "checkout -f -q main", "")
            .respond(&plugin_dir(), "pull --ff-only -q", "");

        BranchVersion::at("main", "def5678")
            .upgrade(&git, &plugin_dir())
            .unwrap();
        assert_eq!(
            git.calls_in(&plugin_dir()),
            vec!["checkout -f -q main", "pull --ff-only -q"]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Version::from_spec("v1.2.5").unwrap().to_string(), "v1.2.5");
        assert_eq!(Version::from_spec("main").unwrap().to_string(), "main");
        assert_eq!(
            Version::Branch(BranchVersion::at("main", "abc1234")).to_string(),
            "main@abc1234"
        );
    }
}
