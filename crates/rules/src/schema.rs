//! Rule-set document schema (source format version 3).
//!
//! ```json
//! {
//!     "version": 3,
//!     "rules": [
//!         { "domain_suffix": ["example.com"] }
//!     ]
//! }
//! ```
//!
//! Clause keys are optional; a present key always carries an array, and an
//! empty array is emitted rather than dropped.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::loader::EntryList;

/// Rule-set source format version understood by the compiler.
pub const RULE_SET_VERSION: u32 = 3;

/// A versioned rule-set document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDocument {
    pub version: u32,
    pub rules: Vec<RuleClause>,
}

/// One headless rule. Field order fixes the JSON key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleClause {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_suffix: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_cidr: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_range: Option<Vec<String>>,
}

impl RuleClause {
    /// Clause matching the given domain suffixes.
    pub fn domain_suffix(domains: EntryList) -> Self {
        Self {
            domain_suffix: Some(domains),
            ..Default::default()
        }
    }
}

impl RuleDocument {
    /// Wrap clauses in a document at [`RULE_SET_VERSION`].
    pub fn new(rules: Vec<RuleClause>) -> Self {
        Self {
            version: RULE_SET_VERSION,
            rules,
        }
    }

    /// Single-clause document of domain suffixes.
    pub fn domain_suffix(domains: EntryList) -> Self {
        Self::new(vec![RuleClause::domain_suffix(domains)])
    }

    /// Render as pretty JSON with 4-space indentation.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        Ok(buf)
    }
}
