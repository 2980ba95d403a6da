//! Error Types
//!
//! Errors raised by the plugin lifecycle engine. Expected conditions
//! (a plugin that is not installed, a repository without version tags, a
//! missing tmux configuration) have their own variants so callers can
//! branch on them; gateway and filesystem failures are carried through
//! verbatim.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type for plugin lifecycle operations
pub type TimResult<T> = Result<T, TimError>;

#[derive(Error, Debug)]
pub enum TimError {
    /// The plugin directory does not exist or is not a directory
    #[error("Plugin {name} is not installed")]
    NotInstalled { name: String },

    /// A tag-based check found no valid version tags
    #[error("No versions available")]
    NoVersionsAvailable,

    /// No tmux configuration file could be located
    #[error("No tmux.conf file found")]
    NoTmuxConfig,

    /// A git command ran but exited unsuccessfully
    #[error("git {command} failed in {dir}: {status}")]
    Git {
        command: String,
        dir: PathBuf,
        status: ExitStatus,
    },

    /// The version control tool could not be started at all
    #[error("Failed to run {program}: {source}")]
    GitSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The lockfile exists but does not contain a valid document
    #[error("Lockfile {path} could not be parsed: {source}")]
    LockfileParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A plugin identity that cannot be used as a directory name
    #[error("Invalid plugin name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// A version spec that cannot be used for the requested operation
    #[error("Invalid version '{spec}'")]
    InvalidVersion { spec: String },

    /// A plugin script exited unsuccessfully
    #[error("Plugin script {script} failed: {status}")]
    ScriptFailed { script: PathBuf, status: ExitStatus },

    /// Unexpected output from an external tool
    #[error("Unexpected output from '{command}': {output}")]
    UnexpectedOutput { command: String, output: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TimError {
    /// Create a not installed error
    pub fn not_installed<S: Into<String>>(name: S) -> Self {
        Self::NotInstalled { name: name.into() }
    }

    /// Create an invalid name error
    pub fn invalid_name<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid version error
    pub fn invalid_version<S: Into<String>>(spec: S) -> Self {
        Self::InvalidVersion { spec: spec.into() }
    }

    /// Create an unexpected output error
    pub fn unexpected_output<C: Into<String>, O: Into<String>>(command: C, output: O) -> Self {
        Self::UnexpectedOutput {
            command: command.into(),
            output: output.into(),
        }
    }

    /// Check if the error means "plugin directory absent"
    pub fn is_not_installed(&self) -> bool {
        matches!(self, TimError::NotInstalled { .. })
    }

    /// Check if the error is an expected condition rather than a failure of
    /// git, the filesystem or a corrupted lockfile
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            TimError::NotInstalled { .. } | TimError::NoVersionsAvailable | TimError::NoTmuxConfig
        )
    }

    /// Check if the error came from the version control tool
    pub fn is_gateway_error(&self) -> bool {
        matches!(self, TimError::Git { .. } | TimError::GitSpawn { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = TimError::not_installed("tmux-plugins/tmux-sensible");
        assert_eq!(
            error.to_string(),
            "Plugin tmux-plugins/tmux-sensible is not installed"
        );
        assert_eq!(
            TimError::NoVersionsAvailable.to_string(),
            "No versions available"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(TimError::not_installed("a/b").is_not_installed());
        assert!(TimError::not_installed("a/b").is_expected());
        assert!(TimError::NoVersionsAvailable.is_expected());
        assert!(TimError::NoTmuxConfig.is_expected());

        let io_error: TimError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(!io_error.is_expected());
        assert!(!io_error.is_not_installed());
        assert!(!io_error.is_gateway_error());
    }

    #[test]
    fn test_io_error_is_transparent() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error: TimError = io_error.into();
        assert_eq!(error.to_string(), "gone");
    }
}
