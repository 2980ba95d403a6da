//! Release tag validation and ordering
//!
//! Tags follow the `v`-prefixed semantic version convention. The shorthand
//! forms `vMAJOR` and `vMAJOR.MINOR` are accepted and compare as if the
//! missing components were zero; pre-release and build suffixes need the
//! full `vMAJOR.MINOR.PATCH` form. Build metadata never affects ordering.

use std::cmp::Ordering;

use semver::{BuildMetadata, Version};

/// Prefix carried by every version tag
pub const VERSION_PREFIX: char = 'v';

/// Parse a `v`-prefixed tag into a comparable version.
/// Returns `None` for anything that is not a valid version tag.
pub fn parse(tag: &str) -> Option<Version> {
    let body = tag.strip_prefix(VERSION_PREFIX)?;

    if body.contains(&['-', '+'][..]) {
        return Version::parse(body).ok();
    }

    let components: Vec<&str> = body.split('.').collect();
    if components.len() > 3 || !components.iter().all(|c| is_numeric_identifier(c)) {
        return None;
    }

    let mut padded = components.join(".");
    for _ in components.len()..3 {
        padded.push_str(".0");
    }
    Version::parse(&padded).ok()
}

fn is_numeric_identifier(component: &str) -> bool {
    !component.is_empty()
        && component.bytes().all(|b| b.is_ascii_digit())
        && (component == "0" || !component.starts_with('0'))
}

pub fn is_valid(tag: &str) -> bool {
    parse(tag).is_some()
}

/// Compare two tags by semantic version precedence.
/// Invalid tags sort before valid ones and are equal to each other.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse(a), parse(b)) {
        (Some(a), Some(b)) => precedence(a).cmp(&precedence(b)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn precedence(mut version: Version) -> Version {
    version.build = BuildMetadata::EMPTY;
    version
}

/// Greatest valid tag in `candidates`, or an empty string when none are valid.
/// Among tags of equal precedence the earliest wins.
///
/// Candidates are trimmed before validation, so raw `git tag` output lines
/// can be passed straight in.
pub fn max_version<S: AsRef<str>>(candidates: &[S]) -> String {
    candidates
        .iter()
        .map(|candidate| candidate.as_ref().trim())
        .filter_map(|candidate| parse(candidate).map(|version| (candidate, precedence(version))))
        .reduce(|best, next| if next.1 > best.1 { next } else { best })
        .map(|(candidate, _)| candidate.to_string())
        .unwrap_or_default()
}

/// Valid tags from `candidates`, trimmed and sorted ascending by precedence
pub fn sort_versions<S: AsRef<str>>(candidates: &[S]) -> Vec<String> {
    let mut versions: Vec<(String, Version)> = candidates
        .iter()
        .map(|candidate| candidate.as_ref().trim())
        .filter_map(|candidate| parse(candidate).map(|version| (candidate.to_string(), precedence(version))))
        .collect();

    versions.sort_by(|(_, a), (_, b)| a.cmp(b));
    versions.into_iter().map(|(tag, _)| tag).collect()
}
