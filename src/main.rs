mod cli;
mod logging;
mod reporter;

use anyhow::Context;
use audio_duper::config::{self, AppConfig};
use audio_duper::index::{index_paths, DedupIndex};
use audio_duper::media::tool_available;
use audio_duper::{audit, Destination, Pipeline, ScanFilter};
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands, MissingArgs, ProcessArgs};
use colored::*;
use dotenv::dotenv;
use reporter::CliReporter;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info, warn};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let config = match config::load_configuration(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let result = match args.command {
        Some(Commands::Process(process_args)) => run_process(config, process_args),
        Some(Commands::Audit) => run_audit(&config),
        Some(Commands::Missing(missing_args)) => run_missing(&config, missing_args),
        Some(Commands::CountIndex) => run_count_index(&config),
        Some(Commands::PrintConfig) => {
            print_config(&config);
            Ok(())
        }
        Some(Commands::CheckTools) => {
            check_tools(&config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run_process(config: AppConfig, args: ProcessArgs) -> anyhow::Result<()> {
    let config = config.with_overrides(args.sources, args.destination);
    let roots = config.source_roots();
    if roots.is_empty() {
        warn!("No source paths configured, nothing to do");
        return Ok(());
    }
    info!("Processing directories: {:?}", roots);
    check_tools(&config);

    let mut pipeline = Pipeline::from_config(&config).context("opening index and destination")?;
    let reporter = CliReporter::new();
    let report = pipeline.run(&roots, &reporter);

    println!();
    report.print_summary();
    match pipeline.index().counts() {
        Ok(counts) => info!("Index: {}", counts),
        Err(err) => error!("Error counting index keys: {}", err),
    }

    if let Some(report_path) = &config.report_path {
        report
            .write_csv(Path::new(report_path))
            .with_context(|| format!("writing report to {}", report_path))?;
        info!("Report written to {}", report_path.green());
    }

    Ok(())
}

fn run_audit(config: &AppConfig) -> anyhow::Result<()> {
    let index = DedupIndex::open(Path::new(&config.index_dir))?;
    let destination = Destination::open(&config.destination)?;
    let result = audit::audit_destination(&index, &destination)?;

    for path in &result.missing {
        warn!("No destination copy for {}", path);
    }
    info!(
        "{} of {} indexed recordings missing from {}",
        format!("{}", result.missing.len()).red(),
        result.total,
        config.destination
    );
    Ok(())
}

fn run_missing(config: &AppConfig, args: MissingArgs) -> anyhow::Result<()> {
    let destination = Destination::open(&config.destination)?;
    let filter = ScanFilter::new(&config.ignore_patterns, &config.extensions);
    let missing = audit::find_missing(&config.source_roots(), &filter, &destination, &args.output)?;
    info!(
        "{} missing files written to {}",
        format!("{}", missing.len()).red(),
        args.output.display()
    );
    Ok(())
}

fn run_count_index(config: &AppConfig) -> anyhow::Result<()> {
    info!("Counting index keys...");
    let index = DedupIndex::open(Path::new(&config.index_dir))?;
    let counts = index.counts()?;
    info!("Total keys in content index: {}", counts.content_keys);
    info!("Total keys in fingerprint index: {}", counts.fingerprint_keys);
    info!("Total keys in duplicate index: {}", counts.duplicate_keys);
    info!("Total ignored paths: {}", counts.ignored_paths);
    Ok(())
}

fn print_config(config: &AppConfig) {
    println!("Configuration: {:#?}", config);
    println!("Source roots: {:?}", config.source_roots());
    let locations: Vec<PathBuf> = index_paths(Path::new(&config.index_dir)).to_vec();
    println!("Index locations: {:?}", locations);
}

fn check_tools(config: &AppConfig) {
    for program in [&config.ffprobe_path, &config.fpcalc_path] {
        if tool_available(program) {
            info!("{} {}", program, "available".green());
        } else {
            warn!("{} {}", program, "not found or not working".red());
        }
    }
}
