use std::fmt;

use crate::error::{TimError, TimResult};

/// Canonical plugin identity, usually `owner/repo`.
///
/// Names are trimmed and ASCII-lowercased on construction, wherever they
/// come from, so that lookups, lockfile keys and plugin directories agree.
/// The name doubles as a relative path below the plugin root and must not
/// escape it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginName(String);

impl PluginName {
    pub fn parse(raw: &str) -> TimResult<Self> {
        let name = raw.trim().to_ascii_lowercase();

        if name.is_empty() {
            return Err(TimError::invalid_name(raw, "name is empty"));
        }

        if name.starts_with('/') {
            return Err(TimError::invalid_name(raw, "name must be relative"));
        }

        // Empty segments from `//` or a trailing `/` collapse away
        let segments: Vec<&str> = name.split('/').filter(|segment| !segment.is_empty()).collect();
        if segments.iter().any(|segment| matches!(*segment, "." | "..")) {
            return Err(TimError::invalid_name(raw, "name must not contain '.' or '..' segments"));
        }
        if segments.is_empty() {
            return Err(TimError::invalid_name(raw, "name is empty"));
        }
        let name = segments.join("/");

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PluginName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for PluginName {
    type Err = TimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
