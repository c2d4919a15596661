//! Rule-set assembly for sing-box.
//!
//! This crate provides:
//! - Line-delimited list loading with soft handling of missing files
//! - The version 3 rule-set JSON schema and its builders
//! - Category directory batching with keyword exclusion
//! - Domain + subnet merging, including the UDP port band policy
//! - Compilation through a pluggable [`ArtifactCompiler`]
//! - The [`Pipeline`] driver tying these together

pub mod artifact;
pub mod batch;
pub mod combine;
pub mod compiler;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod schema;

pub use artifact::{ArtifactResult, ArtifactStatus, ArtifactWriter};
pub use compiler::{ArtifactCompiler, SingBoxCompiler};
pub use error::{CompileError, Result, RuleError};
pub use loader::{load_entries, EntryList};
pub use pipeline::{Pipeline, RunReport};
pub use schema::{RuleClause, RuleDocument, RULE_SET_VERSION};
