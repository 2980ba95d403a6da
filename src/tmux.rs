//! The parts of tmux that tim needs to know about
//!
//! Plugins are loaded from the user's tmux configuration by a line running
//! `tim load`. These helpers find that configuration and check whether the
//! line is present.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use log::debug;

use crate::error::{TimError, TimResult};

/// The configuration line that loads plugins when tmux starts
pub const LOAD_HOOK: &str = "run-shell 'tim load'";

/// Version reported by `tmux -V`, e.g. `3.3a`
pub fn tmux_version() -> TimResult<String> {
    let output = Command::new("tmux")
        .arg("-V")
        .stdin(Stdio::null())
        .output()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_tmux_version(&stdout)
        .map(str::to_string)
        .ok_or_else(|| TimError::unexpected_output("tmux -V", stdout.trim()))
}

/// Extract the version from `tmux -V` output
pub fn parse_tmux_version(output: &str) -> Option<&str> {
    let mut words = output.split_whitespace();
    match (words.next(), words.next()) {
        (Some("tmux"), Some(version)) => Some(version),
        _ => None,
    }
}

/// Locate the tmux configuration: `~/.tmux.conf`, then
/// `<config_dir>/tmux/tmux.conf`
pub fn find_config_path() -> TimResult<PathBuf> {
    let candidates = [
        dirs::home_dir().map(|home| home.join(".tmux.conf")),
        dirs::config_dir().map(|dir| dir.join("tmux").join("tmux.conf")),
    ];
    first_existing(candidates.iter().flatten())
}

fn first_existing<'a, I>(candidates: I) -> TimResult<PathBuf>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    for candidate in candidates {
        debug!("Looking for tmux configuration at {}", candidate.display());
        if candidate.is_file() {
            return Ok(candidate.clone());
        }
    }
    Err(TimError::NoTmuxConfig)
}

/// Whether the configuration at `path` already runs `tim load`
pub fn config_loads_plugins(path: &Path) -> TimResult<bool> {
    Ok(has_load_hook(&fs::read_to_string(path)?))
}

pub fn has_load_hook(contents: &str) -> bool {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .any(runs_tim_load)
}

/// `tim load` as separate words, where `tim` may be a path ending in `/tim`
fn runs_tim_load(line: &str) -> bool {
    let words: Vec<&str> = line
        .split(|c: char| c.is_whitespace() || matches!(c, '\'' | '"' | ';'))
        .filter(|word| !word.is_empty())
        .collect();
    words
        .windows(2)
        .any(|pair| pair[1] == "load" && pair[0].rsplit('/').next() == Some("tim"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_tmux_version() {
        assert_eq!(parse_tmux_version("tmux 3.3a\n"), Some("3.3a"));
        assert_eq!(parse_tmux_version("tmux next-3.5"), Some("next-3.5"));
        assert_eq!(parse_tmux_version(""), None);
        assert_eq!(parse_tmux_version("screen 4.0"), None);
    }

    #[test]
    fn test_load_hook_detection() {
        assert!(has_load_hook("set -g mouse on\nrun-shell 'tim load'\n"));
        assert!(has_load_hook("  run '~/.cargo/bin/tim load'"));
        assert!(!has_load_hook("# run-shell 'tim load'\nset -g mouse on"));
        assert!(!has_load_hook(""));
        assert!(has_load_hook("run-shell \"/usr/local/bin/tim load\""));
    }

    #[test]
    fn test_load_hook_needs_whole_words() {
        assert!(!has_load_hook("set -g @victim loads"));
        assert!(!has_load_hook("set -g @victim load"));
        assert!(!has_load_hook("run-shell 'tim loader'"));
        assert!(!has_load_hook("run-shell 'mytim load'"));
    }

    #[test]
    fn test_first_existing_candidate_wins() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join(".tmux.conf");
        let fallback = temp_dir.path().join("tmux").join("tmux.conf");
        fs::create_dir_all(fallback.parent().unwrap()).unwrap();
        fs::write(&fallback, LOAD_HOOK).unwrap();

        assert_eq!(first_existing([&missing, &fallback]).unwrap(), fallback);
        assert!(config_loads_plugins(&fallback).unwrap());
    }

    #[test]
    fn test_no_config_found() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join(".tmux.conf");
        assert!(matches!(first_existing([&missing]), Err(TimError::NoTmuxConfig)));
    }
}
