//! # Scheduling Experiment Analyzer - Main Entry Point
//!
//! The main function performs these key operations:
//! 1. **Parse arguments**: command-line runs, missing groups and outputs
//! 2. **Initialize logging**: colorized tracing output honoring `RUST_LOG`
//! 3. **Load runs**: read and validate every simulator log named with `--run`
//! 4. **Analyze**: compute per-run metrics, series and the baseline ranking
//! 5. **Report**: print the console tables and write JSON/CSV results
//!
//! ## Error Handling
//!
//! Depending on the `--continue-on-error` flag, a run that fails to load or
//! validate either stops the analysis (default) or is logged, recorded in the
//! `rejected` list of the results document, and skipped.

use anyhow::{Context, Result};
use clap::Parser;
use sched_analyzer::{
    cli::{AnalysisConfig, Args, RunSpec},
    loader::load_raw_records,
    logging::init_logging,
    report::render_report,
    AnalysisError, ExperimentId, MetricsEngine, ResultsManager, RunCollectionBuilder,
};
use tracing::{error, info};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    info!("Starting Scheduling Experiment Analyzer v{}", sched_analyzer::VERSION);

    let config = AnalysisConfig::from_args(&args)?;
    let mut results_manager = ResultsManager::new(&config.output_file);
    if let Some(path) = &config.summary_csv {
        results_manager = results_manager.with_summary_csv(path);
    }
    if let Some(path) = &config.series_csv {
        results_manager = results_manager.with_series_csv(path);
    }

    let mut builder = RunCollectionBuilder::new();
    for spec in &config.runs {
        match load_run(&mut builder, spec) {
            Ok(id) => info!("Loaded run {}", id),
            Err(e) => {
                let error_type = e
                    .downcast_ref::<AnalysisError>()
                    .map_or("io", AnalysisError::kind);
                error!(error_type, "Failed to load run {}: {:#}", spec, e);
                if !config.continue_on_error {
                    return Err(e);
                }
                results_manager.add_rejected(spec.to_string(), format!("{:#}", e));
            }
        }
    }
    for group in &config.missing {
        builder.mark_missing(group.scheduler, group.dimension);
    }

    let engine = match config.threads {
        Some(threads) => MetricsEngine::with_threads(threads),
        None => MetricsEngine::new(),
    };
    let report = builder.build().analyze(&engine);

    print!("{}", render_report(&report));
    results_manager.finalize(&report)?;

    info!("Analysis completed successfully");
    Ok(())
}

/// Load one simulator log and add it to the collection.
fn load_run(builder: &mut RunCollectionBuilder, spec: &RunSpec) -> Result<ExperimentId> {
    let raw = load_raw_records(&spec.path)?;
    let id = builder
        .add(&spec.identity, raw)
        .with_context(|| format!("Invalid run {}", spec.identity))?;
    Ok(id)
}
