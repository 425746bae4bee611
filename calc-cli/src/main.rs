mod cli;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use clinical_engine::{CalculationRequest, ClinicalEngine};
use colored::Colorize;
use error_common::log_error;
use reference_data::{EngineSettings, LogFormat, ReferenceSet};
use std::io::{self, IsTerminal, Read};
use std::path::Path;
use std::{env, fs};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = EngineSettings::load(cli.config.as_deref()).context("Failed to load settings")?;
    init_tracing(&settings, cli.verbose)?;

    let source = settings
        .reference_source()
        .context("Failed to open reference data")?;
    let references = ReferenceSet::load(source.as_ref())
        .with_context(|| format!("Failed to load reference data from {}", source.describe()))?;
    let engine = ClinicalEngine::new(references).with_normalized_bsa_default(settings.bsa_normalized_default);

    let request = match cli.command {
        Command::Tables => {
            let summary = engine.references().summary();
            return if cli.json {
                output::print_json(&summary)
            } else {
                output::print_summary(&summary);
                Ok(())
            };
        }
        Command::Run { path } => read_request(path.as_deref())?,
        Command::Growth(args) => args.into_request()?,
        Command::Bp(args) => args.into_request(),
        Command::Bilirubin(args) => args.into_request(),
        Command::Dose(args) => args.into_request(),
    };

    let result = engine.calculate(&request).map_err(|e| {
        log_error(request.kind(), &e);
        anyhow::Error::new(e).context(format!("{} calculation failed", request.kind()))
    })?;
    info!(calculation = result.kind(), "Calculation complete");

    if cli.json {
        output::print_json(&result)
    } else {
        output::print_result(&result);
        println!("\n{} {}", "→".bright_green(), result.label().bold());
        Ok(())
    }
}

fn read_request(path: Option<&Path>) -> Result<CalculationRequest> {
    let text = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file {}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read request from stdin")?;
            text
        }
    };
    serde_json::from_str(&text).context("Invalid calculation request")
}

fn init_tracing(settings: &EngineSettings, verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { settings.log_level.as_str() };
    let use_colors = env::var_os("NO_COLOR").is_none() && io::stderr().is_terminal();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "pedcalc={level},clinical_engine={level},reference_data={level},error_common={level}"
        ))
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    match settings.log_format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(verbose)
                    .with_ansi(use_colors),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(false)
                    .with_ansi(false)
                    .json(),
            )
            .try_init(),
    }
    .context("Failed to initialize logging")
}
