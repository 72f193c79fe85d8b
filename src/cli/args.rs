//! Command line argument parsing for Docdex CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Docdex - resolve documentation symbol names to their canonical URLs
#[derive(Parser, Debug, Clone)]
#[command(name = "docdex")]
#[command(about = "A documentation symbol inventory cache and resolver")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Docdex Contributors")]
#[command(long_about = None)]
pub struct DocdexArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Override the configuration directory holding the inventory store
    #[arg(long, value_name = "DIR", env = "DOCDEX_BASE_PATH")]
    pub base_path: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl DocdexArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Register an inventory source
    Add(AddArgs),

    /// Resolve a symbol name and print its documentation locations
    List(ListArgs),

    /// Resolve a symbol name and open each location in a browser
    Browse(BrowseArgs),

    /// List registered inventory sources
    Sources(SourcesArgs),
}

/// Arguments for registering an inventory source
#[derive(Parser, Debug, Clone)]
pub struct AddArgs {
    /// Base documentation URL or exact inventory URL
    #[arg(value_name = "URL")]
    pub url: String,
}

/// Arguments for resolving a symbol name
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Symbol name to resolve
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Show doctype, project, and version alongside each location
    #[arg(short, long)]
    pub long: bool,
}

/// Arguments for opening resolved locations in a browser
#[derive(Parser, Debug, Clone)]
pub struct BrowseArgs {
    /// Symbol name to resolve
    #[arg(value_name = "NAME")]
    pub name: String,
}

/// Arguments for listing registered sources
#[derive(Parser, Debug, Clone)]
pub struct SourcesArgs {
    /// Show the record count of each source
    #[arg(short, long)]
    pub long: bool,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_add_command() {
        let args =
            DocdexArgs::try_parse_from(["docdex", "add", "https://docs.example/en/latest"]).unwrap();

        if let Command::Add(add_args) = args.command {
            assert_eq!(add_args.url, "https://docs.example/en/latest");
        } else {
            panic!("Expected Add command");
        }
    }

    #[test]
    fn test_list_command() {
        let args = DocdexArgs::try_parse_from(["docdex", "list", "foo", "--long"]).unwrap();

        if let Command::List(list_args) = args.command {
            assert_eq!(list_args.name, "foo");
            assert!(list_args.long);
        } else {
            panic!("Expected List command");
        }
    }

    #[test]
    fn test_browse_command() {
        let args = DocdexArgs::try_parse_from(["docdex", "browse", "Config"]).unwrap();

        if let Command::Browse(browse_args) = args.command {
            assert_eq!(browse_args.name, "Config");
        } else {
            panic!("Expected Browse command");
        }
    }

    #[test]
    fn test_base_path_override() {
        let args = DocdexArgs::try_parse_from([
            "docdex",
            "--base-path",
            "/tmp/docdex-test",
            "sources",
        ])
        .unwrap();

        assert_eq!(args.base_path, Some(PathBuf::from("/tmp/docdex-test")));
        assert!(matches!(args.command, Command::Sources(_)));
    }

    #[test]
    fn test_verbosity_levels() {
        // Default verbosity
        let args = DocdexArgs::try_parse_from(["docdex", "sources"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        // Multiple verbose flags
        let args = DocdexArgs::try_parse_from(["docdex", "-vv", "sources"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        // Quiet flag
        let args = DocdexArgs::try_parse_from(["docdex", "--quiet", "sources"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args = DocdexArgs::try_parse_from(["docdex", "--format", "json", "list", "foo"]).unwrap();
        assert!(matches!(args.output_format, OutputFormat::Json));
    }
}
