use std::process::ExitCode;

use anyhow::Context;
use sitemap_gen::cli::{Cli, OutputFormat, VerbosityLevel};
use sitemap_gen::config::ConfigManager;
use sitemap_gen::entry::UrlCollection;
use sitemap_gen::error::SitemapError;
use sitemap_gen::generator::SitemapGenerator;
use sitemap_gen::input::load_entries;
use sitemap_gen::logging::setup_logging;
use sitemap_gen::output::Output;

/// Exit status when the files were written but do not conform to the schema
const EXIT_SCHEMA_VIOLATION: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    setup_logging(cli.verbosity().log_filter());

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<SitemapError>() {
                Some(sitemap_err) => {
                    let output = Output::new(VerbosityLevel::Normal, OutputFormat::Human);
                    eprintln!("{}", output.format_error(sitemap_err));
                    if sitemap_err.is_schema_violation() {
                        return ExitCode::from(EXIT_SCHEMA_VIOLATION);
                    }
                }
                None => eprintln!("Error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ConfigManager::load_config(&cli)
        .await
        .context("Failed to load configuration")?;

    let entries = load_entries(&cli.input).await?;
    let collection: UrlCollection = entries.into_iter().collect();

    let output = Output::new(config.output.verbosity(), config.output.format.into());
    let generator = SitemapGenerator::new(config.generation, &config.validation)?;

    let report = tokio::task::spawn_blocking(move || generator.generate(&collection))
        .await
        .context("Generation task panicked")??;

    print!("{}", output.format_report(&report));
    Ok(())
}
