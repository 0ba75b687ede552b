//! Output formats for search state outside the TUI

pub mod html;
pub mod text;

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// comfy-table cards
    #[default]
    Text,
    /// Escaped HTML fragment
    Html,
    /// Raw JSON as returned by the server
    Json,
}
