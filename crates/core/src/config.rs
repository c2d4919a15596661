use std::collections::{BTreeSet, HashSet};
use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

pub const ENV_ROOT: &str = "RULEGEN_ROOT";
pub const ENV_COMPILER: &str = "RULEGEN_COMPILER";
pub const ENV_JSON_DIR: &str = "RULEGEN_JSON_DIR";
pub const ENV_SRS_DIR: &str = "RULEGEN_SRS_DIR";

/// Artifact base name for a source file: its name without directory or extension.
///
/// Names that are empty or not valid UTF-8 are rejected rather than mangled.
pub fn artifact_name(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Port band used for the UDP-only voice traffic clause.
pub const DEFAULT_UDP_PORT_BAND: &str = "50000:65535";

// ── Top-level config ──────────────────────────────────────────

/// Everything the pipeline needs to know about inputs, outputs and the compiler.
///
/// Constructed once at start-up and passed by reference to every stage.
/// Relative paths are resolved against [`PipelineConfig::root`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Base directory for every relative input and output path.
    pub root: PathBuf,
    pub output: OutputConfig,
    pub compiler: CompilerConfig,
    /// Plain domain-suffix rule-sets, one artifact per source file.
    pub domain_sets: Vec<DomainSetSource>,
    pub categories: CategoryConfig,
    /// Domain + subnet rule-sets, one artifact per pair.
    pub combined: Vec<CombinedPair>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            output: OutputConfig::default(),
            compiler: CompilerConfig::default(),
            domain_sets: vec![
                DomainSetSource::new("russia_inside", "Russia/inside-raw.lst"),
                DomainSetSource::new("russia_outside", "Russia/outside-raw.lst"),
                DomainSetSource::new("ukraine_inside", "Ukraine/inside-raw.lst"),
            ],
            categories: CategoryConfig::default(),
            combined: vec![
                CombinedPair::service(
                    "discord",
                    CombinePolicy::UdpPortBand {
                        ports: DEFAULT_UDP_PORT_BAND.to_string(),
                    },
                ),
                CombinedPair::service("twitter", CombinePolicy::Standard),
                CombinedPair::service("meta", CombinePolicy::Standard),
                CombinedPair::service("telegram", CombinePolicy::Standard),
            ],
        }
    }
}

impl PipelineConfig {
    /// Load config from the given TOML file, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            tracing::debug!("no config file given, using defaults");
            return Ok(Self::default());
        };

        tracing::debug!(path = %path.display(), "loading config");
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `RULEGEN_*` environment overrides (call `load_dotenv()` first).
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(env_opt);
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ENV_ROOT) {
            self.root = PathBuf::from(root);
        }
        if let Some(program) = lookup(ENV_COMPILER) {
            self.compiler.program = program;
        }
        if let Some(dir) = lookup(ENV_JSON_DIR) {
            self.output.json_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_SRS_DIR) {
            self.output.srs_dir = PathBuf::from(dir);
        }
    }

    /// Resolve a configured path against `root`. Absolute paths are returned unchanged.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn json_dir(&self) -> PathBuf {
        self.resolve(&self.output.json_dir)
    }

    pub fn srs_dir(&self) -> PathBuf {
        self.resolve(&self.output.srs_dir)
    }

    /// Reject configurations that would spawn nothing useful or overwrite artifacts.
    ///
    /// Category outputs are discovered at run time, so only domain sets and
    /// combined pairs are checked for colliding base names.
    pub fn validate(&self) -> Result<()> {
        if self.compiler.enabled && self.compiler.program.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "compiler.program must not be empty".to_string(),
            ));
        }
        if self.compiler.jobs == 0 {
            return Err(ConfigError::Invalid(
                "compiler.jobs must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for set in &self.domain_sets {
            if set.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "domain set for '{}' has an empty name",
                    set.path.display()
                )));
            }
            if !seen.insert(set.name.clone()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate output name '{}'",
                    set.name
                )));
            }
        }
        for pair in &self.combined {
            let name = pair.output_name().ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "combined pair subnets path '{}' has no file name",
                    pair.subnets.display()
                ))
            })?;
            if !seen.insert(name.clone()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate output name '{name}'"
                )));
            }
            if let CombinePolicy::UdpPortBand { ports } = &pair.policy {
                if ports.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "combined pair '{name}' has an empty port band"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Render the effective config as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Pipeline config:");
        tracing::info!("  root:        {}", self.root.display());
        tracing::info!(
            "  output:      json={}, srs={}",
            self.json_dir().display(),
            self.srs_dir().display()
        );
        tracing::info!(
            "  compiler:    program={}, enabled={}, jobs={}",
            self.compiler.program,
            self.compiler.enabled,
            self.compiler.jobs
        );
        tracing::info!("  domain sets: {}", self.domain_sets.len());
        tracing::info!(
            "  categories:  dirs={}, exclude={:?}",
            self.categories.directories.len(),
            self.categories.exclude_keywords
        );
        tracing::info!("  combined:    {}", self.combined.len());
    }
}

// ── Output ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Staging directory for JSON rule documents.
    pub json_dir: PathBuf,
    /// Directory for compiled binary rule-sets.
    pub srs_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_dir: PathBuf::from("JSON"),
            srs_dir: PathBuf::from("SRS"),
        }
    }
}

// ── Compiler ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Executable invoked as `<program> rule-set compile <json> -o <srs>`.
    pub program: String,
    /// When false, only JSON documents are written.
    pub enabled: bool,
    /// Worker threads for the category compile pass. 1 = sequential.
    pub jobs: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "sing-box".to_string(),
            enabled: true,
            jobs: 1,
        }
    }
}

// ── Sources ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainSetSource {
    /// Output base name for the JSON/SRS pair.
    pub name: String,
    pub path: PathBuf,
}

impl DomainSetSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    pub directories: Vec<PathBuf>,
    /// Files whose name contains any of these tokens are skipped.
    pub exclude_keywords: BTreeSet<String>,
    /// Sort directory entries by file name before processing.
    pub sort_entries: bool,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            directories: vec![PathBuf::from("Categories"), PathBuf::from("Services")],
            exclude_keywords: ["meta", "twitter", "discord"]
                .into_iter()
                .map(String::from)
                .collect(),
            sort_entries: true,
        }
    }
}

impl CategoryConfig {
    /// Whether a file name contains any exclusion token.
    pub fn is_excluded(&self, file_name: &str) -> bool {
        self.exclude_keywords
            .iter()
            .any(|keyword| file_name.contains(keyword.as_str()))
    }
}

/// How a domain list and a subnet list are merged into clauses.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CombinePolicy {
    /// One clause carrying both `domain_suffix` and `ip_cidr`.
    #[default]
    Standard,
    /// Domains in their own clause; subnets restricted to UDP on a port band.
    UdpPortBand { ports: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedPair {
    pub subnets: PathBuf,
    pub domains: PathBuf,
    #[serde(default)]
    pub policy: CombinePolicy,
}

impl CombinedPair {
    /// Pair `Subnets/IPv4/<name>.lst` with `Services/<name>.lst`.
    pub fn service(name: &str, policy: CombinePolicy) -> Self {
        Self {
            subnets: PathBuf::from(format!("Subnets/IPv4/{name}.lst")),
            domains: PathBuf::from(format!("Services/{name}.lst")),
            policy,
        }
    }

    /// Output base name: the subnet file's name without directory or extension.
    pub fn output_name(&self) -> Option<String> {
        artifact_name(&self.subnets)
    }
}
