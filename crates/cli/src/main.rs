mod logging;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use photolib_core::{
    app_paths, import_tree, load_config, save_config, AppConfig, FileStatus, ImportReport,
    ImportStats, NativeCreationTime,
};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "photolib")]
#[command(about = "Copies photos into a <year>/<make> library, skipping byte-identical copies")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Import(ImportArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    Init {
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Debug, Args)]
struct ImportArgs {
    /// Folder to scan. Falls back to `source_root` from the config.
    source: Option<PathBuf>,
    #[arg(long)]
    library: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[arg(long)]
    log_dir: Option<PathBuf>,
    #[arg(long)]
    max_collision_suffix: Option<u32>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Import(args) => cmd_import(args),
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(),
            ConfigAction::Init { force } => cmd_config_init(force),
        },
    }
}

fn cmd_import(args: ImportArgs) -> Result<()> {
    let config = load_config()?;
    let source = args
        .source
        .or_else(|| config.source_root.clone())
        .context("no source folder given and no source_root in the config")?;

    let mut options = config.import_options();
    if let Some(library) = args.library {
        options.library_root = library;
    }
    if args.max_collision_suffix.is_some() {
        options.max_collision_suffix = args.max_collision_suffix;
    }
    options.dry_run = args.dry_run;

    let log_dir = match args.log_dir {
        Some(dir) => dir,
        None => app_paths()?.log_dir,
    };
    let (_guard, log_path) = logging::init(&log_dir, &config.log_level)?;

    let report = import_tree(
        &source,
        &config.skip_file_names,
        &options,
        &NativeCreationTime,
        print_progress,
    )?;
    eprintln!();

    match args.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            print_table(&report);
        }
    }

    if report.stats.failed > 0 {
        eprintln!(
            "{} file(s) failed, see {}",
            report.stats.failed,
            log_path.display()
        );
    }
    if report.dry_run {
        eprintln!("dry run: nothing was copied. Drop --dry-run to import.");
    }

    Ok(())
}

fn progress_line(stats: &ImportStats) -> String {
    format!(
        "\rProcessed: {}\tCopied: {}\tDuplicated: {}\tFailed: {}",
        stats.processed, stats.copied, stats.duplicates, stats.failed
    )
}

// A lost status line is not worth failing the import for.
fn print_progress(stats: &ImportStats) {
    let mut err = std::io::stderr().lock();
    err.write_all(progress_line(stats).as_bytes())
        .and_then(|_| err.flush())
        .ok();
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("config file: {}", paths.config_path.display());
    println!("log folder: {}", paths.log_dir.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_config_init(force: bool) -> Result<()> {
    let paths = app_paths()?;
    if paths.config_path.exists() && !force {
        anyhow::bail!(
            "config already exists: {} (use --force to overwrite)",
            paths.config_path.display()
        );
    }
    let written = save_config(&AppConfig::default())?;
    println!("wrote {}", written.display());
    Ok(())
}

fn print_table(report: &ImportReport) {
    println!("source -> library (status)");
    for file in &report.files {
        let status = match file.status {
            FileStatus::Copied => "copied",
            FileStatus::Duplicate => "duplicate",
            FileStatus::Planned => "planned",
            FileStatus::Failed => "failed",
        };
        match (&file.destination, &file.error) {
            (Some(dest), _) => println!(
                "{} -> {} ({})",
                file.source.display(),
                dest.display(),
                status
            ),
            (None, Some(error)) => {
                println!("{} ({}: {})", file.source.display(), status, error)
            }
            (None, None) => println!("{} ({})", file.source.display(), status),
        }
    }

    println!(
        "\nsummary: processed={} copied={} duplicates={} planned={} failed={} skipped={}",
        report.stats.processed,
        report.stats.copied,
        report.stats.duplicates,
        report.stats.planned,
        report.stats.failed,
        report.stats.skipped
    );
}
