//! End-to-end pipeline runs over a temporary list tree.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tempfile::TempDir;

use rulegen_core::PipelineConfig;
use rulegen_core::DomainSetSource;
use rulegen_rules::{ArtifactCompiler, ArtifactStatus, CompileError, Pipeline, RuleError};

/// Copies the JSON into the output path so binary artifacts can be checked.
#[derive(Clone, Default)]
struct RecordingCompiler {
    calls: Arc<Mutex<Vec<(PathBuf, PathBuf)>>>,
    fail_for: HashSet<String>,
}

impl RecordingCompiler {
    fn failing(names: &[&str]) -> Self {
        Self {
            fail_for: names.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn compiled_names(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(json, _)| json.file_stem().unwrap().to_string_lossy().into_owned())
            .collect()
    }
}

impl ArtifactCompiler for RecordingCompiler {
    fn compile(&self, json_path: &Path, output_path: &Path) -> Result<(), CompileError> {
        self.calls
            .lock()
            .unwrap()
            .push((json_path.to_path_buf(), output_path.to_path_buf()));
        let stem = json_path.file_stem().unwrap().to_string_lossy().into_owned();
        if self.fail_for.contains(&stem) {
            return Err(CompileError::Other(format!("simulated failure for {stem}")));
        }
        fs::copy(json_path, output_path)
            .map(|_| ())
            .map_err(|e| CompileError::Other(e.to_string()))
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// The historical source layout, with twitter and meta lists absent.
fn list_tree() -> (TempDir, PipelineConfig) {
    let dir = TempDir::new().expect("create tempdir");
    let root = dir.path();

    write(root, "Russia/inside-raw.lst", "  youtube.com  \n\n instagram.com\n");
    write(root, "Russia/outside-raw.lst", "gosuslugi.ru\n");
    // Ukraine/inside-raw.lst intentionally missing.
    write(root, "Categories/anime.lst", "anilibria.tv\n");
    write(root, "Categories/gaming.lst", "steampowered.com\n");
    write(root, "Services/discord.lst", "a.example.com\n");
    write(root, "Services/discord_extra.lst", "discord.media\n");
    write(root, "Services/telegram.lst", "telegram.org\n");
    write(root, "Subnets/IPv4/discord.lst", "1.2.3.0/24\n");
    write(root, "Subnets/IPv4/telegram.lst", "91.108.4.0/22\n149.154.160.0/20\n");

    let config = PipelineConfig {
        root: root.to_path_buf(),
        ..Default::default()
    };
    (dir, config)
}

fn read_json(root: &Path, name: &str) -> Value {
    let bytes = fs::read(root.join("JSON").join(format!("{name}.json"))).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .map(|p| (p.file_name().unwrap().to_string_lossy().into_owned(), fs::read(&p).unwrap()))
        .collect()
}

#[test]
fn full_run_attempts_every_artifact() {
    let (dir, config) = list_tree();
    let compiler = RecordingCompiler::default();
    let pipeline = Pipeline::with_compiler(config, Box::new(compiler.clone())).unwrap();

    let report = pipeline.run();

    let names: Vec<&str> = report.artifacts.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "russia_inside",
            "russia_outside",
            "ukraine_inside",
            "anime",
            "gaming",
            "telegram",
            "discord",
            "twitter",
            "meta",
            "telegram",
        ]
    );
    assert!(!report.has_failures());
    assert_eq!(compiler.compiled_names().len(), names.len());

    for artifact in &report.artifacts {
        assert_eq!(artifact.status, ArtifactStatus::Compiled);
        assert!(artifact.json_path.is_file());
        assert!(artifact.srs_path.is_file());
    }
    assert!(!dir.path().join("JSON/discord_extra.json").exists());
}

#[test]
fn documents_have_expected_shape() {
    let (dir, config) = list_tree();
    let pipeline = Pipeline::with_compiler(config, Box::new(RecordingCompiler::default())).unwrap();
    pipeline.run();
    let root = dir.path();

    assert_eq!(
        read_json(root, "russia_inside"),
        json!({ "version": 3, "rules": [{ "domain_suffix": ["youtube.com", "instagram.com"] }] })
    );
    assert_eq!(
        read_json(root, "ukraine_inside"),
        json!({ "version": 3, "rules": [{ "domain_suffix": [] }] })
    );
    assert_eq!(
        read_json(root, "discord"),
        json!({
            "version": 3,
            "rules": [
                { "domain_suffix": ["a.example.com"] },
                { "network": ["udp"], "ip_cidr": ["1.2.3.0/24"], "port_range": ["50000:65535"] }
            ]
        })
    );
    assert_eq!(
        read_json(root, "twitter"),
        json!({ "version": 3, "rules": [{ "domain_suffix": [], "ip_cidr": [] }] })
    );
    // The combined step runs last and replaces the category document of the same name.
    assert_eq!(
        read_json(root, "telegram"),
        json!({
            "version": 3,
            "rules": [{
                "domain_suffix": ["telegram.org"],
                "ip_cidr": ["91.108.4.0/22", "149.154.160.0/20"]
            }]
        })
    );
}

#[test]
fn repeated_runs_are_byte_identical() {
    let (dir, config) = list_tree();
    let pipeline = Pipeline::with_compiler(config, Box::new(RecordingCompiler::default())).unwrap();

    pipeline.run();
    let first = snapshot(&dir.path().join("JSON"));
    pipeline.run();
    let second = snapshot(&dir.path().join("JSON"));

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn compile_failure_does_not_stop_siblings() {
    let (dir, config) = list_tree();
    let compiler = RecordingCompiler::failing(&["gaming", "discord"]);
    let pipeline = Pipeline::with_compiler(config, Box::new(compiler.clone())).unwrap();

    let report = pipeline.run();

    let failed: Vec<&str> = report.failures().map(|a| a.name.as_str()).collect();
    assert_eq!(failed, vec!["gaming", "discord"]);
    assert!(report.has_failures());

    assert!(dir.path().join("JSON/gaming.json").is_file());
    assert!(!dir.path().join("SRS/gaming.srs").exists());
    assert!(dir.path().join("SRS/anime.srs").is_file());
    assert!(dir.path().join("SRS/twitter.srs").is_file());
    assert_eq!(report.get("anime").unwrap().status, ArtifactStatus::Compiled);
}

#[test]
fn json_only_mode_writes_no_binaries() {
    let (dir, mut config) = list_tree();
    config.compiler.enabled = false;
    let pipeline = Pipeline::from_config(config).unwrap();

    let report = pipeline.run();

    assert!(report
        .artifacts
        .iter()
        .all(|a| a.status == ArtifactStatus::JsonOnly));
    assert!(!report.has_failures());
    assert!(dir.path().join("JSON/discord.json").is_file());
    assert!(!dir.path().join("SRS").exists());
}

#[cfg(unix)]
#[test]
fn missing_compiler_program_is_reported_per_artifact() {
    let (dir, mut config) = list_tree();
    config.compiler.program = "rulegen-no-such-compiler".to_string();
    let pipeline = Pipeline::from_config(config).unwrap();

    let report = pipeline.run();

    assert_eq!(report.failures().count(), report.artifacts.len());
    assert!(report
        .artifacts
        .iter()
        .all(|a| matches!(a.status, ArtifactStatus::CompileFailed { .. })));
    assert!(dir.path().join("JSON/russia_inside.json").is_file());
}

#[test]
fn custom_exclusions_and_output_dirs() {
    let (dir, mut config) = list_tree();
    config.categories.exclude_keywords = ["anime".to_string()].into_iter().collect();
    config.output.json_dir = PathBuf::from("out/json");
    config.output.srs_dir = PathBuf::from("out/srs");
    config.domain_sets.clear();
    config.combined.clear();
    let pipeline = Pipeline::with_compiler(config, Box::new(RecordingCompiler::default())).unwrap();

    let report = pipeline.run();

    let names: HashSet<&str> = report.artifacts.iter().map(|a| a.name.as_str()).collect();
    assert!(!names.contains("anime"));
    assert!(names.contains("gaming"));
    assert!(names.contains("discord"));
    assert!(names.contains("discord_extra"));
    assert!(dir.path().join("out/json/gaming.json").is_file());
    assert!(dir.path().join("out/srs/gaming.srs").is_file());
}

#[test]
fn disabled_compilation_bypasses_supplied_compiler() {
    let (dir, mut config) = list_tree();
    config.compiler.enabled = false;
    let compiler = RecordingCompiler::default();
    let pipeline = Pipeline::with_compiler(config, Box::new(compiler.clone())).unwrap();

    let report = pipeline.run();

    assert!(compiler.compiled_names().is_empty());
    assert!(report
        .artifacts
        .iter()
        .all(|a| a.status == ArtifactStatus::JsonOnly));
    assert!(dir.path().join("JSON/russia_inside.json").is_file());
}

#[test]
fn invalid_config_is_rejected_before_running() {
    let (dir, mut config) = list_tree();
    config
        .domain_sets
        .push(DomainSetSource::new("", "Russia/inside-raw.lst"));

    let result = Pipeline::with_compiler(config.clone(), Box::new(RecordingCompiler::default()));
    assert!(matches!(result, Err(RuleError::Config(_))));

    let result = Pipeline::from_config(config);
    assert!(matches!(result, Err(RuleError::Config(_))));
    assert!(!dir.path().join("JSON").exists());
}
