//! Choosing a version for a plugin
//!
//! Lockfile specs are classified into tag or branch versions, and freshly
//! cloned plugins without a pinned spec get the best version the remote
//! offers: the highest release tag, or the default branch when there are
//! no release tags.

use std::path::Path;
use log::debug;

use super::semver::{self, VERSION_PREFIX};
use super::{BranchVersion, TagVersion, Version};
use crate::error::TimResult;
use crate::git::{self, GitGateway};

/// Classify a lockfile spec.
///
/// A spec that is a valid version tag, as written or with the `v` prefix
/// added, pins a tag (stored in its prefixed form). Anything else names a
/// branch. Blank specs yield `None`.
pub fn version_from_spec(spec: &str) -> Option<Version> {
    let spec = spec.trim();
    if spec.is_empty() {
        return None;
    }

    if semver::is_valid(spec) {
        return Some(Version::Tag(TagVersion::pinned(spec)));
    }

    let prefixed = format!("{}{}", VERSION_PREFIX, spec);
    if semver::is_valid(&prefixed) {
        return Some(Version::Tag(TagVersion::pinned(prefixed)));
    }

    Some(Version::Branch(BranchVersion::tracking(spec)))
}

/// Pick the version to install for the checkout in `dir`, preferring the
/// highest release tag over the default branch
pub fn find_best_version(git: &dyn GitGateway, dir: &Path) -> TimResult<Version> {
    git::fetch_tags(git, dir)?;
    let tags = git::list_version_tags(git, dir)?;

    let highest = semver::max_version(&tags);
    if !highest.is_empty() {
        debug!("Resolved {} to tag {}", dir.display(), highest);
        return Ok(Version::Tag(TagVersion::pinned(highest)));
    }

    let branch = git::default_branch(git, dir)?;
    let hash = git::short_hash(git, dir, &branch)?;
    debug!("No release tags in {}, tracking {}@{}", dir.display(), branch, hash);

    Ok(Version::Branch(BranchVersion::at(branch, hash)))
}
