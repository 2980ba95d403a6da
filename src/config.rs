use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use toml::Value;
use log::{debug, info};

use crate::error::TimResult;
use crate::plugin::DEFAULT_REMOTE_BASE;

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "TIM_CONFIG";

/// Configuration storage - section_name -> key -> value
pub type Configuration = HashMap<String, HashMap<String, String>>;

pub struct ConfigManager {
    config: Configuration,
    config_file_path: Option<PathBuf>,
}

impl ConfigManager {
    pub fn from_config(config: Configuration) -> Self {
        Self {
            config,
            config_file_path: None,
        }
    }

    /// Load the explicit file if given, otherwise the first discovered one.
    /// An explicit file that does not exist is an error; a missing
    /// discovered file just means an empty configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(expand_home(path));
        }

        for path in discover_config_files() {
            debug!("Looking for configuration in {}", path.display());
            if path.is_file() {
                return Self::load_from_file(path);
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(Self::from_config(Configuration::new()))
    }

    pub fn load_from_file(path: PathBuf) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = parse_toml_config(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!("Loaded configuration from {}", path.display());
        Ok(Self {
            config,
            config_file_path: Some(path),
        })
    }

    pub fn config_file_path(&self) -> Option<&Path> {
        self.config_file_path.as_deref()
    }

    /// Value of `key` in `section`, falling back to `[base]`
    pub fn get_value(&self, section: &str, key: &str) -> Option<&String> {
        self.config
            .get(section)
            .and_then(|s| s.get(key))
            .or_else(|| self.config.get("base").and_then(|s| s.get(key)))
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>> {
        match self.get_value(section, key) {
            Some(value) => match value.to_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(anyhow::anyhow!("Invalid boolean value for {}.{}: {}", section, key, value)),
            },
            None => Ok(None),
        }
    }

    pub fn get_usize(&self, section: &str, key: &str) -> Result<Option<usize>> {
        match self.get_value(section, key) {
            Some(value) => value
                .parse::<usize>()
                .map(Some)
                .with_context(|| format!("Invalid number for {}.{}: {}", section, key, value)),
            None => Ok(None),
        }
    }

    pub fn get_log_level(&self, section: &str, key: &str) -> Result<Option<log::LevelFilter>> {
        match self.get_value(section, key) {
            Some(value) => Ok(Some(crate::logging::parse_log_level(value)?)),
            None => Ok(None),
        }
    }

    /// Path value with a leading `~` expanded
    pub fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.get_value(section, key).map(|value| expand_home(Path::new(value)))
    }

    /// `[paths] plugin-dir`, defaulting to `<config_dir>/tim/plugins`
    pub fn plugin_dir(&self) -> TimResult<PathBuf> {
        match self.get_path("paths", "plugin-dir") {
            Some(path) => Ok(path),
            None => tim_config_dir().map(|dir| dir.join("plugins")),
        }
    }

    /// `[paths] lockfile`, if configured
    pub fn lockfile_path(&self) -> Option<PathBuf> {
        self.get_path("paths", "lockfile")
    }

    pub fn git_program(&self) -> &str {
        self.get_value("git", "program").map_or("git", String::as_str)
    }

    pub fn remote_base(&self) -> &str {
        self.get_value("git", "remote-base")
            .map_or(DEFAULT_REMOTE_BASE, String::as_str)
    }

    /// `[upgrade] jobs`, defaulting to the number of CPUs
    pub fn upgrade_jobs(&self) -> Result<usize> {
        match self.get_usize("upgrade", "jobs")? {
            Some(0) => Err(anyhow::anyhow!("upgrade.jobs must be at least 1")),
            Some(jobs) => Ok(jobs),
            None => Ok(num_cpus::get()),
        }
    }
}

/// `<config_dir>/tim`, where the lockfile and plugins live by default
pub fn tim_config_dir() -> TimResult<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tim")).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "cannot determine the user configuration directory",
        )
        .into()
    })
}

/// Candidate configuration files, in order of precedence
fn discover_config_files() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        paths.push(expand_home(Path::new(&env_path)));
    }
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("tim").join("config.toml"));
    }
    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".tim.toml"));
    }

    paths
}

/// Replace a leading `~` with the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

fn parse_toml_config(content: &str) -> Result<Configuration> {
    let table: toml::Table = content.parse().context("Failed to parse TOML content")?;

    let mut config = Configuration::new();
    flatten_toml_table(&table, "", &mut config);
    Ok(config)
}

/// Flatten nested tables into `section.subsection` keys. Top-level scalars
/// land in `[base]`.
fn flatten_toml_table(table: &toml::Table, prefix: &str, config: &mut Configuration) {
    for (key, value) in table {
        match value {
            Value::Table(subtable) => {
                let section = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_toml_table(subtable, &section, config);
            }
            _ => {
                let section = if prefix.is_empty() { "base" } else { prefix };
                config
                    .entry(section.to_string())
                    .or_default()
                    .insert(key.clone(), toml_value_to_string(value));
            }
        }
    }
}

fn toml_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn manager(content: &str) -> ConfigManager {
        ConfigManager::from_config(parse_toml_config(content).unwrap())
    }

    #[test]
    fn test_parse_toml_config() {
        let config = parse_toml_config(
            r#"
color = false

[paths]
plugin-dir = "/srv/tmux/plugins"

[upgrade]
jobs = 4
"#,
        )
        .unwrap();

        assert_eq!(config["base"]["color"], "false");
        assert_eq!(config["paths"]["plugin-dir"], "/srv/tmux/plugins");
        assert_eq!(config["upgrade"]["jobs"], "4");
    }

    #[test]
    fn test_base_fallback() {
        let manager = manager(
            r#"
[base]
console-level = "info"

[git]
program = "/usr/local/bin/git"
"#,
        );

        assert_eq!(manager.get_value("git", "program").unwrap(), "/usr/local/bin/git");
        assert_eq!(manager.get_value("git", "console-level").unwrap(), "info");
        assert!(manager.get_value("git", "missing").is_none());
    }

    #[test]
    fn test_type_conversion() {
        let manager = manager(
            r#"
[base]
color = "true"
fancy = "maybe"
console-level = "debug"

[upgrade]
jobs = "lots"
"#,
        );

        assert_eq!(manager.get_bool("base", "color").unwrap(), Some(true));
        assert!(manager.get_bool("base", "fancy").is_err());
        assert_eq!(
            manager.get_log_level("base", "console-level").unwrap(),
            Some(log::LevelFilter::Debug)
        );
        assert!(manager.upgrade_jobs().is_err());
    }

    #[test]
    fn test_defaults() {
        let manager = ConfigManager::from_config(Configuration::new());
        assert_eq!(manager.git_program(), "git");
        assert_eq!(manager.remote_base(), "https://github.com");
        assert_eq!(manager.upgrade_jobs().unwrap(), num_cpus::get());
        assert!(manager.lockfile_path().is_none());
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let manager = manager("[upgrade]\njobs = 0\n");
        assert!(manager.upgrade_jobs().is_err());
    }

    #[test]
    fn test_home_expansion() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/.tmux.conf")), home.join(".tmux.conf"));
        }
        assert_eq!(expand_home(Path::new("/etc/tim.toml")), PathBuf::from("/etc/tim.toml"));
        assert_eq!(expand_home(Path::new("~other/x")), PathBuf::from("~other/x"));
    }

    #[test]
    fn test_config_file_loading() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(&temp_file, "[paths]\nlockfile = \"/tmp/tim.json\"\n").unwrap();

        let manager = ConfigManager::load(Some(temp_file.path())).unwrap();
        assert_eq!(manager.lockfile_path(), Some(PathBuf::from("/tmp/tim.json")));
        assert_eq!(manager.config_file_path(), Some(temp_file.path()));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(ConfigManager::load(Some(Path::new("/nonexistent/tim.toml"))).is_err());
    }
}
