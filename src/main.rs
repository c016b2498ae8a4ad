use clap::Parser;
use dataset_tools::cli::{Cli, execute};
use dataset_tools::config::ToolsConfig;
use dataset_tools::output::OutputFormatter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = match ToolsConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            OutputFormatter::error(&format!("Error loading configuration: {}", e));
            return;
        }
    };

    match execute(&cli.command, &config) {
        Ok(report) => {
            OutputFormatter::plain(&report.to_string());
            if cli.command.is_dry_run() {
                OutputFormatter::dry_run_notice("No files were modified.");
            } else if report.has_problems() {
                OutputFormatter::warning("Some files could not be processed. See above.");
            } else {
                OutputFormatter::success("Done.");
            }
        }
        Err(e) => OutputFormatter::error(&e.to_string()),
    }
}
