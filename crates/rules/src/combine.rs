//! Domain + subnet rule-sets.
//!
//! Most services get one clause carrying both `domain_suffix` and `ip_cidr`.
//! A [`CombinePolicy::UdpPortBand`] pair instead splits the subnets into a
//! second clause restricted to UDP on a port band, so the CIDR match does not
//! apply to every protocol and port.

use rulegen_core::{CombinePolicy, CombinedPair, PipelineConfig};

use crate::error::{Result, RuleError};
use crate::loader::{load_entries, EntryList};
use crate::schema::{RuleClause, RuleDocument};

/// Merge a domain list and a subnet list under the given policy.
pub fn combined_document(
    domains: EntryList,
    subnets: EntryList,
    policy: &CombinePolicy,
) -> RuleDocument {
    match policy {
        CombinePolicy::Standard => RuleDocument::new(vec![RuleClause {
            domain_suffix: Some(domains),
            ip_cidr: Some(subnets),
            ..Default::default()
        }]),
        CombinePolicy::UdpPortBand { ports } => RuleDocument::new(vec![
            RuleClause::domain_suffix(domains),
            RuleClause {
                network: Some(vec!["udp".to_string()]),
                ip_cidr: Some(subnets),
                port_range: Some(vec![ports.clone()]),
                ..Default::default()
            },
        ]),
    }
}

/// Load both lists of a pair and build its document.
///
/// Returns the artifact base name (the subnet file's stem) with the document.
/// Either list may be missing; it then contributes an empty array.
pub fn build_combined(
    config: &PipelineConfig,
    pair: &CombinedPair,
) -> Result<(String, RuleDocument)> {
    let name = pair
        .output_name()
        .ok_or_else(|| RuleError::InvalidName(pair.subnets.clone()))?;

    let domains = load_entries(&config.resolve(&pair.domains))?;
    let subnets = load_entries(&config.resolve(&pair.subnets))?;

    Ok((name, combined_document(domains, subnets, &pair.policy)))
}
