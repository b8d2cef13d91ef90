use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, ValueEnum};
use log::{info, warn, LevelFilter};
use mediafiler_core::{
    load_config, process_batch, run_exiftool, validate_directory, validate_file_or_directory,
    BatchContext, BatchOptions, BatchReport, ConfigSource, DestinationResolver, RecordOutcome,
    DEFAULT_CONFIG_TOML,
};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "mediafiler")]
#[command(about = "Files photos and videos into a dated directory tree using their metadata")]
struct Cli {
    /// Directory (or single file) to read media from
    #[arg(required_unless_present = "dump_example_config")]
    work_dir: Option<PathBuf>,
    /// Root of the destination tree
    #[arg(required_unless_present = "dump_example_config")]
    dest_root: Option<PathBuf>,
    /// Show what would happen without moving anything
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Increase logging verbosity to debug level
    #[arg(long, default_value_t = false)]
    debug: bool,
    /// Print the example configuration file and exit
    #[arg(long, default_value_t = false)]
    dump_example_config: bool,
    /// Use the example configuration when no config file is found in the search paths
    #[arg(long, default_value_t = false)]
    use_default_config: bool,
    #[arg(long)]
    config_file: Option<PathBuf>,
    #[arg(long)]
    exiftool_binary: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.dump_example_config {
        print!("{DEFAULT_CONFIG_TOML}");
        return Ok(());
    }

    cmd_file(cli)
}

fn log_level(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    }
}

/// `RUST_LOG` refines the default level; `--debug` always wins.
fn init_logger(debug: bool) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(log_level(false)).parse_default_env();
    if debug {
        builder.filter_level(log_level(true));
    }
    builder
        .format(|buf, record| {
            let level = record.level().as_str().chars().next().unwrap_or(' ');
            writeln!(
                buf,
                "{} {} :: {}",
                Local::now().format("%H:%M:%S"),
                level,
                record.args()
            )
        })
        .init();
}

fn cmd_file(cli: Cli) -> Result<()> {
    let loaded = load_config(cli.config_file.as_deref(), cli.use_default_config)
        .context("configuration could not be loaded")?;
    let config = loaded.config;

    init_logger(cli.debug || config.debug);

    match &loaded.source {
        ConfigSource::File(path) => info!("configuration loaded from {}", path.display()),
        ConfigSource::Defaults => warn!("falling back to default configuration"),
    }

    let dry_run = cli.dry_run || config.dry_run;
    if dry_run {
        info!("dry-run mode enabled");
    }

    let rules = config.build_rule_sets();
    let rejected =
        rules.rejections.model_replace_rules.len() + rules.rejections.path_ignore_patterns.len();
    if rejected > 0 {
        warn!("{rejected} configuration entries were rejected and will not be used");
    }

    let exiftool = locate_exiftool(cli.exiftool_binary, config.exiftool_binary.as_deref())?;

    let work_dir = cli.work_dir.context("working directory was not found in arguments")?;
    let dest_root = cli
        .dest_root
        .context("destination root directory was not found in arguments")?;
    validate_file_or_directory(&work_dir).context("working directory is not valid for use")?;
    validate_directory(&dest_root).context("destination directory is not valid for use")?;
    info!("pre-flight checks passed.");

    let records = run_exiftool(&exiftool, &work_dir)?;
    if records.is_empty() {
        info!("exiftool output was empty. exiting.");
        return Ok(());
    }
    info!("found {} files to process", records.len());

    let resolver = DestinationResolver::new(&dest_root)?.with_max_suffix(config.max_suffix);
    let ctx = BatchContext {
        naming: &rules.naming,
        ignore_filter: &rules.ignore_filter,
        resolver: &resolver,
    };
    let report = process_batch(&records, &ctx, &BatchOptions { dry_run });

    match cli.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_table(&report),
    }

    if dry_run {
        eprintln!("dry-run mode: no files were moved. run without --dry-run to apply.");
    }

    Ok(())
}

fn locate_exiftool(flag: Option<PathBuf>, configured: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = flag {
        info!("using user-specified exiftool binary: {}", path.display());
        return Ok(path);
    }
    if let Some(path) = configured.filter(|p| !p.is_empty()) {
        info!("using configured exiftool binary: {path}");
        return Ok(PathBuf::from(path));
    }
    let found = which::which("exiftool").context("exiftool binary was not found")?;
    info!("exiftool found at: {}", found.display());
    Ok(found)
}

fn print_table(report: &BatchReport) {
    println!("source -> destination (status)");
    for record in &report.records {
        let source = record.source_file.as_deref().unwrap_or("<unknown>");
        let (target, status) = describe(&record.outcome);
        println!("{source} -> {target} ({status})");
    }

    let stats = &report.stats;
    println!(
        "\nsummary: processed={} placed={} planned={} ignored={} underivable={} same_file={} duplicates={} failed={}",
        stats.processed,
        stats.placed,
        stats.planned,
        stats.ignored,
        stats.underivable,
        stats.same_file,
        stats.duplicates,
        stats.failed
    );
}

fn describe(outcome: &RecordOutcome) -> (String, String) {
    match outcome {
        RecordOutcome::Placed { destination } => {
            (destination.display().to_string(), "placed".to_string())
        }
        RecordOutcome::Planned { destination } => {
            (destination.display().to_string(), "dry-run".to_string())
        }
        RecordOutcome::Ignored => ("-".to_string(), "ignored".to_string()),
        RecordOutcome::SourceMissing => ("-".to_string(), "no SourceFile".to_string()),
        RecordOutcome::Underivable { reason } => ("-".to_string(), reason.to_string()),
        RecordOutcome::SameFileAsSource { destination } => {
            (destination.display().to_string(), "already in place".to_string())
        }
        RecordOutcome::Duplicate { existing } => {
            (existing.display().to_string(), "duplicate".to_string())
        }
        RecordOutcome::Exhausted { attempts } => (
            "-".to_string(),
            format!("no free name after {attempts} attempts"),
        ),
        RecordOutcome::ResolveFailed { reason } => ("-".to_string(), reason.to_string()),
        RecordOutcome::MoveFailed {
            destination,
            reason,
        } => (destination.display().to_string(), reason.clone()),
    }
}
