//! Category batch processing.
//!
//! Every regular file in each category directory becomes one domain-suffix
//! rule-set named after the file's stem, unless its name contains an
//! exclusion token. Processing is two-pass: all JSON documents are staged
//! first, then the staged documents are compiled, so one file's failure does
//! not stop discovery of the others.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use rulegen_core::{artifact_name, CategoryConfig, PipelineConfig};

use crate::artifact::{ArtifactResult, ArtifactWriter};
use crate::error::{Result, RuleError};
use crate::loader::load_entries;
use crate::schema::RuleDocument;

/// A category file after the staging pass.
enum Slot {
    Staged { name: String, json_path: PathBuf },
    Done(ArtifactResult),
}

impl Slot {
    fn finish(self, writer: &ArtifactWriter) -> ArtifactResult {
        match self {
            Slot::Staged { name, json_path } => writer.compile(&name, &json_path),
            Slot::Done(result) => result,
        }
    }
}

/// List the category files of one directory, applying the exclusion filter.
///
/// Anything that is not a regular file is skipped. A directory
/// that cannot be read is logged and treated as empty.
pub fn discover(dir: &Path, categories: &CategoryConfig) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "failed to read category directory");
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory entry");
                continue;
            }
        };
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy().into_owned();

        if categories.is_excluded(&file_name) {
            debug!(path = %path.display(), "skipping excluded category");
            continue;
        }
        if !path.is_file() {
            continue;
        }
        files.push(path);
    }

    if categories.sort_entries {
        files.sort();
    }
    files
}

/// Artifact base name for a category file: its name without the extension.
pub fn category_name(path: &Path) -> Result<String> {
    artifact_name(path).ok_or_else(|| RuleError::InvalidName(path.to_path_buf()))
}

fn stage(path: &Path, name: &str, writer: &ArtifactWriter) -> Result<PathBuf> {
    let domains = load_entries(path)?;
    writer.write_json(name, &RuleDocument::domain_suffix(domains))
}

/// Stage and compile every category file of the configured directories.
///
/// Results come back in staging order, whether the compile pass runs
/// sequentially or on a pool of `compiler.jobs` threads.
///
/// Each base name is staged at most once per pass. A later file with the same
/// name is reported as failed and leaves the first file's document in place,
/// so no two compiles ever target the same output.
pub fn process_categories(config: &PipelineConfig, writer: &ArtifactWriter) -> Vec<ArtifactResult> {
    let categories = &config.categories;

    let mut staged: HashMap<String, PathBuf> = HashMap::new();
    let mut slots = Vec::new();
    for dir in &categories.directories {
        let dir = config.resolve(dir);
        for path in discover(&dir, categories) {
            let name = match category_name(&path) {
                Ok(name) => name,
                Err(e) => {
                    let unit = path.file_name().map_or_else(
                        || path.display().to_string(),
                        |n| n.to_string_lossy().into_owned(),
                    );
                    slots.push(Slot::Done(writer.failed(&unit, &e)));
                    continue;
                }
            };

            if let Some(first) = staged.get(&name) {
                let e = RuleError::DuplicateName {
                    name: name.clone(),
                    path: path.clone(),
                    first: first.clone(),
                };
                slots.push(Slot::Done(writer.failed(&name, &e)));
                continue;
            }

            let slot = match stage(&path, &name, writer) {
                Ok(json_path) => {
                    staged.insert(name.clone(), path);
                    Slot::Staged { name, json_path }
                }
                Err(e) => Slot::Done(writer.failed(&name, &e)),
            };
            slots.push(slot);
        }
    }

    info!(staged = slots.len(), "compiling category rule-sets");
    compile_staged(slots, writer, config.compiler.jobs)
}

fn compile_staged(slots: Vec<Slot>, writer: &ArtifactWriter, jobs: usize) -> Vec<ArtifactResult> {
    if jobs <= 1 {
        return slots.into_iter().map(|slot| slot.finish(writer)).collect();
    }

    match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
        Ok(pool) => pool.install(|| {
            slots
                .into_par_iter()
                .map(|slot| slot.finish(writer))
                .collect()
        }),
        Err(e) => {
            warn!(error = %e, jobs, "failed to build compile thread pool, compiling sequentially");
            slots.into_iter().map(|slot| slot.finish(writer)).collect()
        }
    }
}
