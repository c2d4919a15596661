use std::path::PathBuf;

use clap::Parser;

use rulegen_core::PipelineConfig;

/// Build sing-box rule-sets from plain domain and subnet lists.
///
/// Writes one JSON rule-set per list and compiles each into a binary
/// `.srs` file with `sing-box rule-set compile`.
#[derive(Parser, Debug)]
#[command(name = "rulegen", version, about)]
pub struct CliArgs {
    /// Path to a TOML pipeline config (built-in layout if not set)
    #[arg(long, env = "RULEGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base directory for relative input and output paths
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Rule-set compiler executable
    #[arg(long)]
    pub compiler: Option<String>,

    /// Write JSON rule-sets only, skip compilation
    #[arg(long)]
    pub json_only: bool,

    /// Worker threads for compiling category rule-sets
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Exit with a non-zero status if any artifact failed
    #[arg(long)]
    pub strict: bool,

    /// Print the effective config as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

impl CliArgs {
    /// Apply flag overrides on top of file and environment settings.
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        if let Some(program) = &self.compiler {
            config.compiler.program = program.clone();
        }
        if self.json_only {
            config.compiler.enabled = false;
        }
        if let Some(jobs) = self.jobs {
            config.compiler.jobs = jobs;
        }
    }
}
