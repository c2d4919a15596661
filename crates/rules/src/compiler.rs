//! Binary rule-set compilation.
//!
//! The pipeline only needs one capability from the routing engine: turn a
//! JSON rule-set into its binary form. [`ArtifactCompiler`] models that, with
//! [`SingBoxCompiler`] shelling out to the real tool.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::CompileError;

/// Compiles a JSON rule-set at `json_path` into a binary at `output_path`.
pub trait ArtifactCompiler: Send + Sync {
    fn compile(&self, json_path: &Path, output_path: &Path) -> Result<(), CompileError>;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}

/// Runs `<program> rule-set compile <json> -o <output>` and waits for it.
///
/// There is no timeout: a hung compiler blocks the caller.
pub struct SingBoxCompiler {
    program: String,
}

impl SingBoxCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// Diagnostic text for a failed run: stderr, or stdout when stderr is empty.
fn failure_message(stdout: &[u8], stderr: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::from_utf8_lossy(stdout).trim().to_string()
    } else {
        stderr.to_string()
    }
}

impl ArtifactCompiler for SingBoxCompiler {
    fn compile(&self, json_path: &Path, output_path: &Path) -> Result<(), CompileError> {
        debug!(
            program = %self.program,
            json = %json_path.display(),
            output = %output_path.display(),
            "spawning rule-set compiler"
        );

        let output = Command::new(&self.program)
            .args(["rule-set", "compile"])
            .arg(json_path)
            .arg("-o")
            .arg(output_path)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| CompileError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if !stdout.is_empty() {
            debug!(program = %self.program, stdout, "compiler output");
        }

        if output.status.success() {
            Ok(())
        } else {
            Err(CompileError::Exit {
                status: output.status,
                stderr: failure_message(&output.stdout, &output.stderr),
            })
        }
    }

    fn name(&self) -> &str {
        &self.program
    }
}
