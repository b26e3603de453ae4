use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::config::ConfigOverrides;

#[derive(Debug, Parser)]
#[command(
    name = "scandex",
    about = "Incrementally index scanned lecture PDFs and their metadata"
)]
pub struct Cli {
    /// Directory of PDFs to index (default: data/scans_ocr)
    #[arg(long, global = true)]
    pub source_dir: Option<PathBuf>,

    /// Directory of YAML metadata sidecars (default: meta)
    #[arg(long, global = true)]
    pub meta_dir: Option<PathBuf>,

    /// Directory holding the index (default: index)
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Defaults to `index` when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Location and indexing overrides taken from the command line.
    pub fn overrides(&self) -> ConfigOverrides {
        let (max_pages, prune_orphans) = match &self.command {
            Some(Command::Index(args)) => (args.max_pages, args.prune),
            _ => (None, false),
        };
        ConfigOverrides {
            source_dir: self.source_dir.clone(),
            meta_dir: self.meta_dir.clone(),
            store_dir: self.store_dir.clone(),
            max_pages,
            prune_orphans,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Index new and modified documents (the default)
    Index(IndexArgs),
    /// Show store locations and record count
    Status(StatusArgs),
    /// Print the stored record for a document path
    Get(GetArgs),
    /// List indexed paths matching a glob pattern
    List(ListArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Index --

#[derive(Debug, Default, Parser)]
pub struct IndexArgs {
    /// Only extract text from the first N pages of each document
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Remove records whose source file was deleted
    #[arg(long)]
    pub prune: bool,
}

// -- Status --

#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Get --

#[derive(Debug, Parser)]
pub struct GetArgs {
    /// Document path as stored (source directory joined with file name)
    pub path: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Print only metadata, not the extracted text
    #[arg(long)]
    pub meta: bool,
}

// -- List --

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Glob pattern applied to stored paths
    #[arg(default_value = "*")]
    pub pattern: String,

    /// Output as JSON array
    #[arg(long)]
    pub json: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "scandex",
            &mut std::io::stdout(),
        );
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn no_arguments_means_index_with_defaults() {
        let cli = Cli::parse_from(["scandex"]);
        assert!(cli.command.is_none());
        let overrides = cli.overrides();
        assert_eq!(overrides.source_dir, None);
        assert_eq!(overrides.max_pages, None);
        assert!(!overrides.prune_orphans);
    }

    #[test]
    fn index_flags_reach_overrides() {
        let cli = Cli::parse_from([
            "scandex",
            "--source-dir",
            "pdfs",
            "index",
            "--max-pages",
            "5",
            "--prune",
        ]);
        let overrides = cli.overrides();
        assert_eq!(overrides.source_dir, Some(PathBuf::from("pdfs")));
        assert_eq!(overrides.max_pages, Some(5));
        assert!(overrides.prune_orphans);
    }

    #[test]
    fn global_locations_after_subcommand() {
        let cli =
            Cli::parse_from(["scandex", "status", "--store-dir", "/tmp/idx"]);
        assert_eq!(cli.store_dir, Some(PathBuf::from("/tmp/idx")));
        assert!(matches!(cli.command, Some(Command::Status(_))));
    }

    #[test]
    fn list_defaults_to_everything() {
        let cli = Cli::parse_from(["scandex", "list"]);
        match cli.command {
            Some(Command::List(args)) => {
                assert_eq!(args.pattern, "*");
                assert!(!args.json);
            }
            _ => panic!("expected list command"),
        }
    }

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }
}
