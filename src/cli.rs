//! Command line definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::render::OutputFormat;

/// Autocomplete and record lookup against a CSV lookup server.
///
/// Without a subcommand an interactive terminal UI is started.
#[derive(Debug, Parser)]
#[command(name = "lookup-cli", version, about)]
pub struct Args {
    /// Server base URL (overrides LOOKUP_API_URL and the config file)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Access password (overrides LOOKUP_PASSWORD and the config file)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the server's name column, columns and row count
    Meta {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// List suggestions for a partial name
    Suggest {
        query: String,

        /// Ask the server for at most this many names
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Look up full records for a name
    Lookup {
        name: String,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,

        /// Column to use as card title instead of the server's name column
        #[arg(long)]
        name_col: Option<String>,

        /// Also write the matching rows to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Ask the server to reload its dataset
    Reload,

    /// Write a commented default config file
    GenerateConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
