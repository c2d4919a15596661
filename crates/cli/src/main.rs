mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use rulegen_core::PipelineConfig;
use rulegen_rules::Pipeline;

use crate::cli::CliArgs;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    rulegen_core::load_dotenv();
    let args = CliArgs::parse();

    let mut config = PipelineConfig::load(args.config.as_deref())
        .context("failed to load pipeline configuration")?;
    config.apply_env_overrides();
    args.apply(&mut config);
    config.validate().context("invalid pipeline configuration")?;

    if args.print_config {
        print!("{}", config.to_toml().context("failed to render config")?);
        return Ok(());
    }

    config.log_summary();

    let pipeline = Pipeline::from_config(config).context("failed to build pipeline")?;
    let report = pipeline.run();
    report.log_summary();

    if args.strict && report.has_failures() {
        bail!(
            "{} of {} rule-sets failed",
            report.failures().count(),
            report.artifacts.len()
        );
    }

    info!("done");
    Ok(())
}
