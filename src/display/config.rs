//! Colour configuration
//!
//! Whether colour is used depends on the `--color`/`--no-color` flags, the
//! `[base] color` configuration key, `NO_COLOR`, and whether stdout is a
//! terminal, in that order.

use std::io::IsTerminal;
use colored::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ColourConfig {
    /// Whether colours are enabled at all
    pub enabled: bool,
    /// Whether to respect the NO_COLOR environment variable
    pub respect_no_color: bool,
    /// Colour even when stdout is not a terminal (--color)
    #[serde(skip, default)]
    pub color_forced: bool,
    #[serde(default)]
    pub palette: ColourPalette,
}

impl Default for ColourConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            respect_no_color: true,
            color_forced: false,
            palette: ColourPalette::default(),
        }
    }
}

impl ColourConfig {
    pub fn forced() -> Self {
        Self {
            color_forced: true,
            ..Self::default()
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_color_forced(&mut self, forced: bool) {
        self.color_forced = forced;
    }

    pub fn should_use_colours(&self) -> bool {
        if !self.enabled {
            return false;
        }
        if self.color_forced {
            return true;
        }
        if self.respect_no_color && std::env::var_os("NO_COLOR").is_some() {
            return false;
        }
        std::io::stdout().is_terminal()
    }
}

/// Colour names for each kind of message
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ColourPalette {
    pub error: String,
    pub warning: String,
    pub success: String,
}

impl Default for ColourPalette {
    fn default() -> Self {
        Self {
            error: "red".to_string(),
            warning: "yellow".to_string(),
            success: "green".to_string(),
        }
    }
}

impl ColourPalette {
    pub fn parse_color(color_str: &str) -> Option<Color> {
        match color_str.to_lowercase().as_str() {
            "black" => Some(Color::Black),
            "red" => Some(Color::Red),
            "green" => Some(Color::Green),
            "yellow" => Some(Color::Yellow),
            "blue" => Some(Color::Blue),
            "magenta" => Some(Color::Magenta),
            "cyan" => Some(Color::Cyan),
            "white" => Some(Color::White),
            "bright_black" => Some(Color::BrightBlack),
            "bright_red" => Some(Color::BrightRed),
            "bright_green" => Some(Color::BrightGreen),
            "bright_yellow" => Some(Color::BrightYellow),
            "bright_blue" => Some(Color::BrightBlue),
            "bright_cyan" => Some(Color::BrightCyan),
            _ => None,
        }
    }
}
