//! Colour management and user-facing output

pub mod colours;
pub mod config;
pub mod message;
pub mod table;

pub use colours::ColourManager;
pub use config::{ColourConfig, ColourPalette};
pub use message::{hyperlink, Console};
pub use table::format_compact_table;
