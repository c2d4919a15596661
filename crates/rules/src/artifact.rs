//! JSON staging and compilation of rule-set artifacts.
//!
//! Every artifact is a `<json_dir>/<name>.json` + `<srs_dir>/<name>.srs` pair.
//! The JSON is always written before compilation is attempted, and failures
//! are recorded per artifact instead of being raised.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::compiler::ArtifactCompiler;
use crate::error::{Result, RuleError};
use crate::schema::RuleDocument;

/// Outcome for a single artifact.
#[derive(Debug, Clone)]
pub struct ArtifactResult {
    /// Base name shared by the JSON and binary files.
    pub name: String,
    pub json_path: PathBuf,
    pub srs_path: PathBuf,
    pub status: ArtifactStatus,
}

/// Status of a single artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactStatus {
    /// JSON written and binary compiled.
    Compiled,
    /// JSON written; compilation is disabled.
    JsonOnly,
    /// JSON written; the compiler failed.
    CompileFailed { error: String },
    /// The unit failed before or while writing its JSON.
    Failed { error: String },
}

impl ArtifactStatus {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ArtifactStatus::CompileFailed { .. } | ArtifactStatus::Failed { .. }
        )
    }
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactStatus::Compiled => write!(f, "compiled"),
            ArtifactStatus::JsonOnly => write!(f, "json only"),
            ArtifactStatus::CompileFailed { error } => write!(f, "compile failed: {error}"),
            ArtifactStatus::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Writes rule documents to the JSON directory and hands them to a compiler.
pub struct ArtifactWriter {
    json_dir: PathBuf,
    srs_dir: PathBuf,
    /// `None` means JSON-only mode.
    compiler: Option<Box<dyn ArtifactCompiler>>,
}

impl ArtifactWriter {
    pub fn new(json_dir: PathBuf, srs_dir: PathBuf, compiler: Box<dyn ArtifactCompiler>) -> Self {
        Self {
            json_dir,
            srs_dir,
            compiler: Some(compiler),
        }
    }

    /// Writer that stages JSON documents without compiling them.
    pub fn json_only(json_dir: PathBuf, srs_dir: PathBuf) -> Self {
        Self {
            json_dir,
            srs_dir,
            compiler: None,
        }
    }

    pub fn json_path(&self, name: &str) -> PathBuf {
        self.json_dir.join(format!("{name}.json"))
    }

    pub fn srs_path(&self, name: &str) -> PathBuf {
        self.srs_dir.join(format!("{name}.srs"))
    }

    /// Serialize a document to `<json_dir>/<name>.json`, creating the directory if needed.
    pub fn write_json(&self, name: &str, doc: &RuleDocument) -> Result<PathBuf> {
        fs::create_dir_all(&self.json_dir).map_err(RuleError::io(&self.json_dir))?;

        let path = self.json_path(name);
        let bytes = doc.to_json_pretty()?;
        fs::write(&path, bytes).map_err(RuleError::io(&path))?;

        info!(path = %path.display(), "JSON file generated");
        Ok(path)
    }

    /// Compile an already written JSON document.
    pub fn compile(&self, name: &str, json_path: &Path) -> ArtifactResult {
        let srs_path = self.srs_path(name);
        let status = match &self.compiler {
            None => ArtifactStatus::JsonOnly,
            Some(compiler) => self.run_compiler(compiler.as_ref(), json_path, &srs_path),
        };

        ArtifactResult {
            name: name.to_string(),
            json_path: json_path.to_path_buf(),
            srs_path,
            status,
        }
    }

    fn run_compiler(
        &self,
        compiler: &dyn ArtifactCompiler,
        json_path: &Path,
        srs_path: &Path,
    ) -> ArtifactStatus {
        if let Err(e) = fs::create_dir_all(&self.srs_dir) {
            let error = RuleError::io(&self.srs_dir)(e);
            warn!(error = %error, "failed to create output directory");
            return ArtifactStatus::Failed {
                error: error.to_string(),
            };
        }

        match compiler.compile(json_path, srs_path) {
            Ok(()) => {
                info!(path = %srs_path.display(), "Compiled .srs file");
                ArtifactStatus::Compiled
            }
            Err(e) => {
                warn!(
                    compiler = compiler.name(),
                    path = %json_path.display(),
                    error = %e,
                    "compile error"
                );
                ArtifactStatus::CompileFailed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Write and compile in one step. Never fails; the outcome is in the result.
    pub fn emit(&self, name: &str, doc: &RuleDocument) -> ArtifactResult {
        match self.write_json(name, doc) {
            Ok(json_path) => self.compile(name, &json_path),
            Err(e) => self.failed(name, &e),
        }
    }

    /// Record a unit-level failure for `name`.
    pub fn failed(&self, name: &str, error: &RuleError) -> ArtifactResult {
        warn!(unit = name, error = %error, "error while processing rule-set");
        ArtifactResult {
            name: name.to_string(),
            json_path: self.json_path(name),
            srs_path: self.srs_path(name),
            status: ArtifactStatus::Failed {
                error: error.to_string(),
            },
        }
    }
}
