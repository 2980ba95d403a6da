//! The lockfile: which plugins are installed, and at which version spec.
//!
//! Stored as JSON, `{"plugins": {"owner/repo": "v1.2.0", ...}}`. Unknown
//! top-level fields are ignored on read. Every command that changes plugins
//! loads the lockfile, edits the in-memory mapping and calls [`Lockfile::save`]
//! before the value is dropped.
//!
//! While a `Lockfile` is alive it holds an exclusive advisory lock on a
//! sibling `.lock` file, so concurrent `tim` invocations take turns. Saving
//! writes a temporary file next to the lockfile and renames it into place.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use fs2::FileExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{TimError, TimResult};
use crate::plugin::{Plugin, PluginName};
use crate::version::Version;

/// File name of the lockfile inside the tim configuration directory
pub const LOCKFILE_NAME: &str = "tim.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct LockfileDocument {
    #[serde(default)]
    plugins: BTreeMap<String, String>,
}

pub struct Lockfile {
    path: PathBuf,
    lock: File,
    specs: BTreeMap<PluginName, String>,
}

impl Lockfile {
    /// Open the lockfile at `path_override`, or at the default location.
    pub fn load(path_override: Option<&Path>) -> TimResult<Self> {
        match path_override {
            Some(path) => Self::open(path),
            None => Self::open(default_path()?),
        }
    }

    /// Open (creating if absent) and parse the lockfile at `path`.
    ///
    /// An empty file is an empty lockfile; anything else that does not
    /// parse is an error.
    pub fn open<P: Into<PathBuf>>(path: P) -> TimResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let lock = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(lock_path(&path))?;
        if lock.try_lock_exclusive().is_err() {
            info!("Waiting for another tim process to release {}", path.display());
            lock.lock_exclusive()?;
        }

        let mut contents = String::new();
        OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)?
            .read_to_string(&mut contents)?;

        let specs = if contents.trim().is_empty() {
            BTreeMap::new()
        } else {
            parse_specs(&path, &contents)?
        };

        debug!("Loaded {} plugin(s) from {}", specs.len(), path.display());
        Ok(Self { path, lock, specs })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The raw name to spec mapping
    pub fn specs(&self) -> &BTreeMap<PluginName, String> {
        &self.specs
    }

    /// Plugins listed in the lockfile, with versions parsed from their specs.
    ///
    /// The plugins are fresh values on every call: changes to their versions
    /// have to be written back with [`Lockfile::set_spec`].
    pub fn plugins(&self) -> Vec<Plugin> {
        self.specs
            .iter()
            .map(|(name, spec)| Plugin::with_version(name.clone(), Version::from_spec(spec)))
            .collect()
    }

    pub fn get_plugin(&self, name: &PluginName) -> Option<Plugin> {
        self.plugins().into_iter().find(|plugin| &plugin.name == name)
    }

    pub fn contains(&self, name: &PluginName) -> bool {
        self.specs.contains_key(name)
    }

    pub fn set_spec<S: Into<String>>(&mut self, name: PluginName, spec: S) {
        self.specs.insert(name, spec.into());
    }

    pub fn remove(&mut self, name: &PluginName) -> Option<String> {
        self.specs.remove(name)
    }

    /// Write the mapping to disk, replacing the previous contents atomically
    pub fn save(&self) -> TimResult<()> {
        let document = LockfileDocument {
            plugins: self
                .specs
                .iter()
                .map(|(name, spec)| (name.to_string(), spec.clone()))
                .collect(),
        };
        let mut contents = serde_json::to_string_pretty(&document).map_err(io::Error::from)?;
        contents.push('\n');

        // Replace the file a symlinked lockfile points at, not the link
        let target = fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone());
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(contents.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&target).map_err(|err| err.error)?;

        debug!("Saved {} plugin(s) to {}", self.specs.len(), self.path.display());
        Ok(())
    }

    /// Release the lockfile. Unsaved changes are discarded.
    pub fn close(self) {}
}

impl Drop for Lockfile {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.lock) {
            warn!("Failed to unlock {}: {}", self.path.display(), err);
        }
    }
}

/// `<config_dir>/tim/tim.json`
pub fn default_path() -> TimResult<PathBuf> {
    crate::config::tim_config_dir().map(|dir| dir.join(LOCKFILE_NAME))
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    path.with_file_name(name)
}

fn parse_specs(path: &Path, contents: &str) -> TimResult<BTreeMap<PluginName, String>> {
    let document: LockfileDocument =
        serde_json::from_str(contents).map_err(|source| TimError::LockfileParse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut specs = BTreeMap::new();
    for (raw_name, spec) in document.plugins {
        let name = PluginName::parse(&raw_name)?;
        if specs.insert(name.clone(), spec).is_some() {
            warn!("Lockfile {} lists {} more than once, keeping the last entry", path.display(), name);
        }
    }
    Ok(specs)
}
