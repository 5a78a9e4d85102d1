use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use book_catalog_core::config::{resolve, Config};
use book_catalog_core::{
    preview, write_books, BookLayout, CatalogError, Catalog, Categorizer, LoadReport, Loader,
    MalformedRowPolicy, OutputFileInfo, OutputPaths, Result, UnmatchedPolicy, ValidationReport,
};

mod args;
use args::{Cli, Commands, ConfigAction, Shell, Unmatched};

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let base_dir = resolve_base_dir(cli.base_dir);
    tracing::debug!(base_dir = %base_dir.display(), "resolved base directory");

    let mut out = report_writer(cli.quiet);

    let result = match cli.command {
        Some(Commands::Build {
            books,
            categories,
            out_dir,
            unmatched,
            strict_rows,
        }) => handle_build(
            &base_dir,
            books.as_deref(),
            categories.as_deref(),
            out_dir.as_deref(),
            unmatched,
            strict_rows,
            &mut out,
        ),
        Some(Commands::Convert {
            input,
            output,
            strict_rows,
        }) => handle_convert(
            &base_dir,
            input.as_deref(),
            output.as_deref(),
            strict_rows,
            &mut out,
        ),
        Some(Commands::Validate {
            out_dir,
            json,
            strict,
        }) => handle_validate(&base_dir, out_dir.as_deref(), json, strict, &mut out),
        Some(Commands::Config { action }) => handle_config(action, &base_dir),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

/// `RUST_LOG` wins; otherwise the level follows -v / -q
fn init_tracing(verbose: bool, quiet: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("book_catalog_core={level},book_catalog={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Where build, convert and validate reports go: stdout, or nowhere under -q
fn report_writer(quiet: bool) -> Box<dyn Write> {
    if quiet {
        Box::new(io::sink())
    } else {
        Box::new(io::stdout())
    }
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "book-catalog", &mut io::stdout());
}

fn resolve_base_dir(cli_base: Option<PathBuf>) -> PathBuf {
    if let Some(base) = cli_base {
        return base;
    }

    if let Ok(base) = std::env::var("BOOK_CATALOG_BASE") {
        return PathBuf::from(base);
    }

    PathBuf::from(".")
}

/// Output locations from config, with `out_dir` replacing `paths.output_dir`
fn output_paths(config: &Config, base_dir: &Path, out_dir: Option<&Path>) -> OutputPaths {
    match out_dir {
        Some(dir) => OutputPaths::new(
            resolve(base_dir, dir),
            &config.paths.books_json,
            &config.paths.categorized_json,
        ),
        None => config.output_paths(base_dir),
    }
}

fn row_policy(config: &Config, strict_rows: bool) -> MalformedRowPolicy {
    if strict_rows {
        MalformedRowPolicy::Error
    } else {
        config.loader.malformed_rows
    }
}

fn handle_build(
    base_dir: &Path,
    books: Option<&Path>,
    categories: Option<&Path>,
    out_dir: Option<&Path>,
    unmatched: Option<Unmatched>,
    strict_rows: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let config = Config::load(base_dir)?;

    let books_path = books
        .map(|p| resolve(base_dir, p))
        .unwrap_or_else(|| config.books_csv(base_dir));
    let categories_path = categories
        .map(|p| resolve(base_dir, p))
        .unwrap_or_else(|| config.categories_csv(base_dir));
    let paths = output_paths(&config, base_dir, out_dir);

    let mut categorizer = Categorizer::from_config(&config.categorize);
    if let Some(policy) = unmatched {
        categorizer = categorizer.with_policy(match policy {
            Unmatched::Drop => UnmatchedPolicy::Drop,
            Unmatched::Bucket => UnmatchedPolicy::Bucket,
            Unmatched::Error => UnmatchedPolicy::Error,
        });
    }

    let loader = Loader::new(row_policy(&config, strict_rows));
    let (table, category_report) = loader.load_categories(&categories_path)?;
    let (books, book_report) = loader.load_books(&books_path, BookLayout::Headed)?;

    let (catalog, outcome) = Catalog::build(books, table, &categorizer)?;
    let written = catalog.write(&paths)?;

    writeln!(out)?;
    write_load(out, "Categories", &categories_path, &category_report)?;
    write_load(out, "Books", &books_path, &book_report)?;
    writeln!(out)?;

    if outcome.sentinel_applied {
        writeln!(
            out,
            "Filed '{}' under '{}'",
            config.categorize.sentinel_book_id.cyan(),
            config.categorize.sentinel_category.cyan()
        )?;
    }
    if !outcome.unmatched.is_empty() {
        let action = match outcome.policy {
            UnmatchedPolicy::Bucket => {
                format!("collected in '{}'", config.categorize.bucket_name)
            }
            _ => "left out of every category".to_string(),
        };
        writeln!(
            out,
            "{} {} books match no category ({})",
            "Warning:".yellow(),
            outcome.unmatched.len(),
            action
        )?;
        let limit = config.report.preview_limit;
        let (shown, rest) = preview(&outcome.unmatched, limit);
        for book in shown {
            writeln!(out, "  - {} ({}): '{}'", book.title, book.id, book.category_name)?;
        }
        if rest > 0 {
            writeln!(out, "  ... and {} more", rest)?;
        }
    }

    writeln!(out)?;
    for info in &written {
        write_saved(out, info)?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "Generated {} categories, processed {} books",
        catalog.categories.len(),
        catalog.books.len()
    )?;

    Ok(())
}

fn handle_convert(
    base_dir: &Path,
    input: Option<&Path>,
    output: Option<&Path>,
    strict_rows: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let config = Config::load(base_dir)?;

    let input_path = input
        .map(|p| resolve(base_dir, p))
        .unwrap_or_else(|| config.convert_csv(base_dir));
    let output_path = output
        .map(|p| resolve(base_dir, p))
        .unwrap_or_else(|| config.output_paths(base_dir).books);

    let loader = Loader::new(row_policy(&config, strict_rows));
    let (books, report) = loader.load_books(&input_path, BookLayout::Positional)?;
    let info = write_books(&output_path, &books)?;

    writeln!(out)?;
    write_load(out, "Books", &input_path, &report)?;
    write_saved(out, &info)?;
    writeln!(out)?;
    writeln!(out, "Converted {} records", books.len())?;

    Ok(())
}

fn handle_validate(
    base_dir: &Path,
    out_dir: Option<&Path>,
    json: bool,
    strict: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let config = Config::load(base_dir)?;
    let paths = output_paths(&config, base_dir, out_dir);

    let catalog = Catalog::read(&paths)?;
    let report = catalog.validate();

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write_report(out, &report, config.report.preview_limit)?;
        writeln!(out)?;
        writeln!(out, "File information:")?;
        for path in [&paths.books, &paths.categorized] {
            write_saved(out, &OutputFileInfo::from_path(path)?)?;
        }
    }

    if strict {
        report.ensure_clean()?;
    }
    Ok(())
}

fn write_load(
    out: &mut dyn Write,
    label: &str,
    path: &Path,
    report: &LoadReport,
) -> io::Result<()> {
    write!(
        out,
        "{} {} rows from {}",
        format!("{}:", label).green(),
        report.rows_loaded(),
        path.display()
    )?;
    if report.rows_skipped > 0 {
        write!(
            out,
            " ({} malformed rows skipped)",
            report.rows_skipped.to_string().yellow()
        )?;
    }
    writeln!(out)
}

fn write_saved(out: &mut dyn Write, info: &OutputFileInfo) -> io::Result<()> {
    writeln!(
        out,
        "  {} {} ({:.2} KB, {})",
        "Saved:".green(),
        info.path.display(),
        info.size_kb(),
        info.sha256.dimmed()
    )
}

fn write_report(
    out: &mut dyn Write,
    report: &ValidationReport,
    limit: usize,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "===== Validation Results =====".bold())?;
    writeln!(out, "1. Total books: {}", report.total_books)?;
    writeln!(out, "2. Total categories: {}", report.total_categories)?;
    writeln!(out, "3. Categories with books: {}", report.categories_with_books)?;
    writeln!(out, "4. Empty categories: {}", report.empty_categories)?;
    writeln!(out, "5. Total books in categories: {}", report.total_categorized_books)?;
    writeln!(
        out,
        "6. Distinct books in categories: {}",
        report.distinct_categorized_books
    )?;
    writeln!(out, "7. Duplicate books: {}", report.duplicates.len())?;
    writeln!(out, "8. Uncategorized books: {}", report.uncategorized.len())?;
    if !report.stray_ids.is_empty() {
        writeln!(
            out,
            "9. Categorized books missing from books.json: {}",
            report.stray_ids.len()
        )?;
    }

    writeln!(out)?;
    if report.duplicates.is_empty() {
        writeln!(out, "{} No duplicate books", "✓".green())?;
    } else {
        writeln!(out, "{}", "Duplicate books:".yellow())?;
        let (shown, rest) = preview(&report.duplicates, limit);
        for dup in shown {
            writeln!(
                out,
                "  - ID: {}, Title: {}, Category: {}",
                dup.id, dup.title, dup.category
            )?;
        }
        if rest > 0 {
            writeln!(out, "  ... and {} more duplicate books", rest)?;
        }
    }

    writeln!(out)?;
    if report.uncategorized.is_empty() {
        writeln!(out, "{} All books are categorized", "✓".green())?;
    } else {
        writeln!(out, "{}", "Uncategorized books:".yellow())?;
        let (shown, rest) = preview(&report.uncategorized, limit);
        for book in shown {
            writeln!(out, "  - ID: {}, Title: {}", book.id, book.title)?;
        }
        if rest > 0 {
            writeln!(out, "  ... and {} more uncategorized books", rest)?;
        }
    }

    if !report.stray_ids.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "Categorized books missing from books.json:".yellow())?;
        let (shown, rest) = preview(&report.stray_ids, limit);
        for id in shown {
            writeln!(out, "  - ID: {}", id)?;
        }
        if rest > 0 {
            writeln!(out, "  ... and {} more", rest)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Book count by category:")?;
    for entry in &report.category_counts {
        writeln!(out, "  - {}: {} books", entry.name.cyan(), entry.count)?;
    }
    Ok(())
}

fn handle_config(action: ConfigAction, base_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load(base_dir)?;
            match config.get(&key) {
                Some(value) => {
                    println!("{}", value);
                }
                None => {
                    return Err(CatalogError::ConfigKeyNotFound { key });
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(base_dir)?;
            config.set(&key, &value)?;
            config.save(base_dir)?;
            println!("{} {} = {}", "Set:".green(), key, value);
        }
        ConfigAction::List => {
            let config = Config::load(base_dir)?;
            println!();
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            println!();
        }
        ConfigAction::Path => {
            let path = Config::path(base_dir);
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            let path = Config::init(base_dir)?;
            println!("{} {}", "Initialized:".green(), path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const BOOKS_CSV: &str = "bookId,title,author,category,description,coverUrl,contentURL,txt\n\
                             b1,Moby Dick,Melville,Fiction,,,,\n\
                             b2,Atlas,Nobody,Maps,,,,\n";
    const CATEGORIES_CSV: &str = "category_uuid,name,description\nc1,Fiction,\n";

    fn catalog_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("books.csv"), BOOKS_CSV).unwrap();
        fs::write(dir.path().join("categories.csv"), CATEGORIES_CSV).unwrap();
        dir
    }

    fn build(dir: &TempDir, out: &mut dyn Write) -> Result<()> {
        handle_build(
            dir.path(),
            Some(Path::new("books.csv")),
            Some(Path::new("categories.csv")),
            Some(Path::new("public")),
            None,
            false,
            out,
        )
    }

    #[test]
    fn test_build_report_goes_to_writer() {
        let dir = catalog_dir();
        let mut out = Vec::new();
        build(&dir, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1 books match no category"));
        assert!(text.contains("Generated 1 categories, processed 2 books"));
        assert!(dir.path().join("public").join("categorized_books.json").exists());
    }

    #[test]
    fn test_validate_report_goes_to_writer() {
        let dir = catalog_dir();
        build(&dir, &mut io::sink()).unwrap();

        let mut out = Vec::new();
        handle_validate(dir.path(), Some(Path::new("public")), false, false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("8. Uncategorized books: 1"));
        assert!(text.contains("ID: b2"));

        let mut out = Vec::new();
        handle_validate(dir.path(), Some(Path::new("public")), true, false, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["total_books"], 2);
    }

    #[test]
    fn test_convert_report_goes_to_writer() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("legacy.csv"),
            "id,title,author,category,description,cover,html,txt\n\
             b1,Moby Dick,Melville,Fiction,,c.jpg,b1.html,b1.txt\n",
        )
        .unwrap();

        let mut out = Vec::new();
        handle_convert(
            dir.path(),
            Some(Path::new("legacy.csv")),
            Some(Path::new("books.json")),
            false,
            &mut out,
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Converted 1 records"));
        let raw = fs::read_to_string(dir.path().join("books.json")).unwrap();
        assert!(raw.contains("\"bookId\": \"b1\""));
        assert!(raw.contains("\"txt\": \"b1.txt\""));
    }

    #[test]
    fn test_quiet_still_writes_files_and_reports_errors() {
        let dir = catalog_dir();
        let mut out = report_writer(true);
        build(&dir, &mut out).unwrap();
        assert!(dir.path().join("public").join("books.json").exists());

        let err = handle_validate(dir.path(), Some(Path::new("missing")), false, false, &mut out)
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
