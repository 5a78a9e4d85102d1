use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "book-catalog")]
#[command(about = "Convert a CSV book catalog to categorized JSON and validate it")]
#[command(version)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output: no reports, errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Base directory holding catalog.toml (default: current directory)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Handling of books whose category matches no category name
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Unmatched {
    /// Leave them out of every category
    Drop,
    /// Collect them in a bucket category
    Bucket,
    /// Abort the build
    Error,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Categorize the book CSV and write books.json + categorized_books.json
    Build {
        /// Book CSV (default: paths.books_csv)
        #[arg(long)]
        books: Option<PathBuf>,

        /// Category CSV (default: paths.categories_csv)
        #[arg(long)]
        categories: Option<PathBuf>,

        /// Output directory (default: paths.output_dir)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Override categorize.unmatched
        #[arg(long, value_enum)]
        unmatched: Option<Unmatched>,

        /// Fail on rows with missing fields instead of skipping them
        #[arg(long)]
        strict_rows: bool,
    },

    /// Convert a positional book CSV to a flat books.json (legacy layout)
    ///
    /// Records are written with the same keys as `build` (bookId, coverUrl,
    /// contentURL, txt), not the legacy id, cover, html_link and txt_link keys.
    Convert {
        /// Book CSV (default: paths.convert_csv)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output JSON file (default: <output_dir>/<books_json>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail on rows with missing fields instead of skipping them
        #[arg(long)]
        strict_rows: bool,
    },

    /// Check the written JSON for duplicate and uncategorized books
    Validate {
        /// Directory holding the JSON files (default: paths.output_dir)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Exit non-zero when duplicates, uncategorized or stray books are found
        #[arg(long)]
        strict: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g., categorize.sentinel_category)
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key (e.g., categorize.unmatched)
        key: String,

        /// Value to set (e.g., "bucket")
        value: String,
    },

    /// List all config values
    List,

    /// Show config file path
    Path,

    /// Initialize config file with defaults
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build() {
        let cli = Cli::parse_from([
            "book-catalog",
            "--base-dir",
            "/srv/catalog",
            "build",
            "--unmatched",
            "drop",
            "--strict-rows",
        ]);

        assert_eq!(cli.base_dir, Some(PathBuf::from("/srv/catalog")));
        match cli.command {
            Some(Commands::Build {
                unmatched,
                strict_rows,
                books,
                ..
            }) => {
                assert!(matches!(unmatched, Some(Unmatched::Drop)));
                assert!(strict_rows);
                assert!(books.is_none());
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn test_convert_help_names_output_keys() {
        let cmd = Cli::command();
        let convert = cmd.find_subcommand("convert").unwrap();
        let help = convert.get_long_about().unwrap().to_string();
        assert!(help.contains("bookId"));
        assert!(help.contains("txt_link"));
    }

    #[test]
    fn test_parse_quiet_after_subcommand() {
        let cli = Cli::parse_from(["book-catalog", "convert", "-q"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_parse_validate_with_global_flag_after_subcommand() {
        let cli = Cli::parse_from(["book-catalog", "validate", "--json", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Some(Commands::Validate {
                json: true,
                strict: false,
                ..
            })
        ));
    }
}
