//! Pipeline driver: domain sets, then categories, then combined pairs.
//!
//! Each step is an independent transformation of input lists into artifacts;
//! no step reads another step's output. Every configured artifact is always
//! attempted and its outcome lands in the [`RunReport`].

use tracing::{info, warn};

use rulegen_core::PipelineConfig;

use crate::artifact::{ArtifactResult, ArtifactWriter};
use crate::batch::process_categories;
use crate::combine::build_combined;
use crate::compiler::{ArtifactCompiler, SingBoxCompiler};
use crate::error::Result;
use crate::loader::load_entries;
use crate::schema::RuleDocument;

/// Per-artifact outcomes of one run, in processing order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub artifacts: Vec<ArtifactResult>,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &ArtifactResult> {
        self.artifacts.iter().filter(|a| a.status.is_failure())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn get(&self, name: &str) -> Option<&ArtifactResult> {
        self.artifacts.iter().find(|a| a.name == name)
    }

    pub fn log_summary(&self) {
        let failed = self.failures().count();
        info!(
            total = self.artifacts.len(),
            ok = self.artifacts.len() - failed,
            failed,
            "rule-set generation finished"
        );
        for artifact in self.failures() {
            warn!(name = %artifact.name, status = %artifact.status, "artifact failed");
        }
    }
}

/// Drives rule-set generation for one [`PipelineConfig`].
pub struct Pipeline {
    config: PipelineConfig,
    writer: ArtifactWriter,
}

impl Pipeline {
    /// Build a pipeline using the configured compiler program, or JSON-only
    /// output when compilation is disabled.
    ///
    /// The config is validated first.
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        let program = config.compiler.program.clone();
        Self::with_compiler(config, Box::new(SingBoxCompiler::new(program)))
    }

    /// Build a pipeline around a specific compiler implementation.
    ///
    /// The config is validated first, and `compiler.enabled = false` still
    /// selects JSON-only output.
    pub fn with_compiler(
        config: PipelineConfig,
        compiler: Box<dyn ArtifactCompiler>,
    ) -> Result<Self> {
        config.validate()?;
        let writer = if config.compiler.enabled {
            ArtifactWriter::new(config.json_dir(), config.srs_dir(), compiler)
        } else {
            ArtifactWriter::json_only(config.json_dir(), config.srs_dir())
        };
        Ok(Self { config, writer })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run all three steps in order.
    pub fn run(&self) -> RunReport {
        let mut report = RunReport::default();
        report.artifacts.extend(self.run_domain_sets());
        report.artifacts.extend(self.run_categories());
        report.artifacts.extend(self.run_combined());
        report
    }

    /// One domain-suffix rule-set per configured source file.
    pub fn run_domain_sets(&self) -> Vec<ArtifactResult> {
        self.config
            .domain_sets
            .iter()
            .map(|set| match load_entries(&self.config.resolve(&set.path)) {
                Ok(domains) => self
                    .writer
                    .emit(&set.name, &RuleDocument::domain_suffix(domains)),
                Err(e) => self.writer.failed(&set.name, &e),
            })
            .collect()
    }

    pub fn run_categories(&self) -> Vec<ArtifactResult> {
        process_categories(&self.config, &self.writer)
    }

    /// One merged domain + subnet rule-set per configured pair.
    pub fn run_combined(&self) -> Vec<ArtifactResult> {
        self.config
            .combined
            .iter()
            .map(|pair| match build_combined(&self.config, pair) {
                Ok((name, doc)) => self.writer.emit(&name, &doc),
                Err(e) => {
                    let unit = pair
                        .output_name()
                        .unwrap_or_else(|| pair.subnets.display().to_string());
                    self.writer.failed(&unit, &e)
                }
            })
            .collect()
    }
}
