//! Plugin lifecycle
//!
//! A plugin is a git checkout below the plugin root, named after its remote
//! identity (`owner/repo`). Installing clones it and checks out a version,
//! uninstalling deletes the checkout, and loading runs its `*.tmux` scripts.

pub mod name;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use log::{debug, info};

use crate::error::{TimError, TimResult};
use crate::git::{self, GitGateway};
use crate::version::{self, semver, BranchVersion, Version};

pub use name::PluginName;

/// File name suffix of the scripts run when a plugin is loaded
pub const SCRIPT_SUFFIX: &str = ".tmux";

/// Where plugins are cloned from unless configured otherwise
pub const DEFAULT_REMOTE_BASE: &str = "https://github.com";

/// Everything plugin operations need besides the plugin itself
#[derive(Clone)]
pub struct PluginEnv {
    plugins_dir: PathBuf,
    remote_base: String,
    git: Arc<dyn GitGateway>,
}

impl PluginEnv {
    pub fn new<P: Into<PathBuf>>(plugins_dir: P, git: Arc<dyn GitGateway>) -> Self {
        Self {
            plugins_dir: plugins_dir.into(),
            remote_base: DEFAULT_REMOTE_BASE.to_string(),
            git,
        }
    }

    /// Clone plugins from `<remote_base>/<name>.git`
    pub fn with_remote_base<S: Into<String>>(mut self, remote_base: S) -> Self {
        self.remote_base = remote_base.into();
        self
    }

    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }

    pub fn git(&self) -> &dyn GitGateway {
        self.git.as_ref()
    }

    pub fn remote_url(&self, name: &PluginName) -> String {
        format!("{}/{}.git", self.remote_base.trim_end_matches('/'), name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plugin {
    pub name: PluginName,
    /// `None` until a version has been resolved
    pub version: Option<Version>,
}

impl Plugin {
    pub fn new(name: PluginName) -> Self {
        Self { name, version: None }
    }

    pub fn with_version(name: PluginName, version: Option<Version>) -> Self {
        Self { name, version }
    }

    /// The spec to record in the lockfile
    pub fn spec(&self) -> Option<&str> {
        self.version.as_ref().map(Version::git_ref)
    }

    /// Checkout directory of this plugin
    pub fn dir(&self, env: &PluginEnv) -> PathBuf {
        env.plugins_dir().join(self.name.as_str())
    }

    /// Fails with `NotInstalled` when the plugin directory is missing or is
    /// not a directory; other filesystem errors are returned as they are.
    pub fn check_installed(&self, env: &PluginEnv) -> TimResult<()> {
        match fs::metadata(self.dir(env)) {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(TimError::not_installed(self.name.as_str())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(TimError::not_installed(self.name.as_str()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Clone the plugin and check out `spec`, or the best available version
    /// when `spec` is blank. The resulting version is stored on the plugin.
    pub fn install(&mut self, env: &PluginEnv, spec: &str) -> TimResult<()> {
        let dir = self.dir(env);
        fs::create_dir_all(&dir)?;

        let url = env.remote_url(&self.name);
        info!("Cloning {} into {}", url, dir.display());
        git::clone_into(env.git(), &dir, &url)?;

        let version = match Version::from_spec(spec) {
            Some(version) => version,
            None => version::find_best_version(env.git(), &dir)?,
        };
        self.checkout_version(env, &version)?;

        self.version = Some(match version {
            Version::Branch(branch) if branch.current_hash().is_empty() => {
                let hash = git::short_hash(env.git(), &dir, branch.branch())?;
                Version::Branch(BranchVersion::at(branch.branch(), hash))
            }
            version => version,
        });
        Ok(())
    }

    pub fn checkout_version(&self, env: &PluginEnv, version: &Version) -> TimResult<()> {
        git::checkout(env.git(), &self.dir(env), version.git_ref())
    }

    /// Delete the plugin checkout. A missing directory is an error.
    pub fn uninstall(&self, env: &PluginEnv) -> TimResult<()> {
        let dir = self.dir(env);
        fs::remove_dir_all(&dir)?;

        // Drop the owner directory once its last plugin is gone.
        if let Some(parent) = dir.parent().filter(|parent| *parent != env.plugins_dir()) {
            if fs::remove_dir(parent).is_ok() {
                debug!("Removed empty directory {}", parent.display());
            }
        }
        Ok(())
    }

    /// Run every `*.tmux` file directly inside the plugin directory, in
    /// directory order, stopping at the first script that fails.
    /// Returns the number of scripts run.
    pub fn load(&self, env: &PluginEnv) -> TimResult<usize> {
        let dir = self.dir(env);
        let mut loaded = 0;

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if !entry.file_name().to_string_lossy().ends_with(SCRIPT_SUFFIX) {
                continue;
            }

            let script = entry.path();
            debug!("Running plugin script {}", script.display());
            let status = Command::new(&script).status()?;
            if !status.success() {
                return Err(TimError::ScriptFailed { script, status });
            }
            loaded += 1;
        }

        Ok(loaded)
    }

    /// Version tags present in the local checkout, lowest first
    pub fn available_versions(&self, env: &PluginEnv) -> TimResult<Vec<String>> {
        self.check_installed(env)?;
        let tags = git::list_version_tags(env.git(), &self.dir(env))?;
        Ok(semver::sort_versions(&tags))
    }
}
