//! User-facing messages
//!
//! Command results go to stdout; warnings and errors go to stderr. Log
//! records are separate and controlled by the logging configuration.

use super::ColourManager;

#[derive(Debug, Clone, Default)]
pub struct Console {
    colours: ColourManager,
}

impl Console {
    pub fn new(colours: ColourManager) -> Self {
        Self { colours }
    }

    pub fn colours(&self) -> &ColourManager {
        &self.colours
    }

    pub fn info(&self, message: &str) {
        println!("{}", message);
    }

    pub fn success(&self, message: &str) {
        println!("{}", self.colours.success(message));
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{}", self.colours.warning(message));
    }

    pub fn error(&self, message: &str) {
        eprintln!("{}", self.colours.error(message));
    }

    /// `text` as a terminal hyperlink to `url`, or plain `text` when not
    /// writing to a colour terminal
    pub fn link(&self, text: &str, url: &str) -> String {
        if self.colours.colours_enabled() {
            hyperlink(text, url)
        } else {
            text.to_string()
        }
    }
}

/// Wrap `text` in an OSC 8 hyperlink escape sequence
pub fn hyperlink(text: &str, url: &str) -> String {
    format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, text)
}
