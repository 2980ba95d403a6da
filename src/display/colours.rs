//! Colouring of user-facing text

use colored::{ColoredString, Colorize};
use super::config::ColourConfig;

#[derive(Debug, Clone)]
pub struct ColourManager {
    config: ColourConfig,
}

impl ColourManager {
    pub fn new() -> Self {
        Self::with_config(ColourConfig::default())
    }

    pub fn with_colours(enabled: bool) -> Self {
        let mut config = ColourConfig::default();
        config.set_enabled(enabled);
        Self::with_config(config)
    }

    pub fn with_config(config: ColourConfig) -> Self {
        Self { config }
    }

    /// Combine the command line flags with the configured default.
    /// `--no-color` wins over `--color`, which wins over the configuration.
    pub fn from_flags(no_color: bool, force_color: bool, configured: Option<bool>) -> Self {
        let mut config = ColourConfig::default();
        if let Some(enabled) = configured {
            config.set_enabled(enabled);
        }
        if force_color {
            config.set_enabled(true);
            config.set_color_forced(true);
        }
        if no_color {
            config.set_enabled(false);
        }
        Self::with_config(config)
    }

    pub fn colours_enabled(&self) -> bool {
        self.config.should_use_colours()
    }

    pub fn error(&self, text: &str) -> ColoredString {
        self.paint(text, &self.config.palette.error)
    }

    pub fn warning(&self, text: &str) -> ColoredString {
        self.paint(text, &self.config.palette.warning)
    }

    pub fn success(&self, text: &str) -> ColoredString {
        self.paint(text, &self.config.palette.success)
    }

    fn paint(&self, text: &str, color_name: &str) -> ColoredString {
        if !self.colours_enabled() {
            return text.normal();
        }
        match super::config::ColourPalette::parse_color(color_name) {
            Some(color) => text.color(color),
            None => text.normal(),
        }
    }
}

impl Default for ColourManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_output_is_plain() {
        let manager = ColourManager::with_colours(false);
        assert_eq!(manager.error("failed").to_string(), "failed");
        assert_eq!(manager.success("done").to_string(), "done");
    }

    #[test]
    fn test_flag_precedence() {
        assert!(!ColourManager::from_flags(true, true, Some(true)).colours_enabled());
        assert!(ColourManager::from_flags(false, true, Some(false)).colours_enabled());
        assert!(!ColourManager::from_flags(false, false, Some(false)).colours_enabled());
    }

    #[test]
    fn test_forced_colour_output() {
        colored::control::set_override(true);
        let manager = ColourManager::from_flags(false, true, None);
        let painted = manager.error("failed").to_string();
        colored::control::unset_override();

        assert!(painted.contains("\x1b["));
        assert!(painted.contains("failed"));
    }
}
