//! Full pipeline orchestration.
//!
//! A run is a single batch pass: load the template (fatal if absent),
//! load the manifests, analyze each manifest into an immutable partial
//! result, then hand everything to the aggregator. Workers never touch
//! shared state; only the final merge sees all partial results.

use anyhow::Result;
use std::collections::BTreeSet;
use std::path::Path;

use crate::config::Config;
use crate::docs::{self, DocumentationCorpus};
use crate::drift;
use crate::manifest::{self, ServiceManifest};
use crate::report::{LoadIssue, Report};
use crate::rules::{self, Rule, RuleViolation};
use crate::template::EnvTemplate;
use crate::vars;

/// The partial result of analyzing one manifest: the variable names it
/// references and the rule violations of its services.
#[derive(Debug)]
pub struct ManifestAnalysis {
    pub referenced: BTreeSet<String>,
    pub violations: Vec<RuleViolation>,
}

/// Analyze one manifest in isolation. Pure over its inputs, so manifests
/// can be processed in any order (or concurrently) and merged afterwards.
pub fn analyze_manifest(
    manifest: &ServiceManifest,
    rules: &[Box<dyn Rule>],
    include_commented: bool,
) -> ManifestAnalysis {
    let tokens = vars::extract_tokens(manifest, include_commented);
    let referenced = vars::referenced_names(&tokens);

    let violations = manifest
        .services
        .values()
        .flat_map(|block| rules::evaluate(block, rules))
        .collect();

    ManifestAnalysis {
        referenced,
        violations,
    }
}

/// Load manifests and analyze them against the rule registry. Returns the
/// partial results together with any per-file load issues.
pub fn analyze_stack(
    root: &Path,
    config: &Config,
) -> Result<(Vec<ServiceManifest>, Vec<ManifestAnalysis>, Vec<LoadIssue>)> {
    let (manifests, issues) = manifest::load_manifests(root, &config.scan)?;
    let rules = rules::registry(&config.rules.disable);

    let analyses = manifests
        .iter()
        .map(|m| analyze_manifest(m, &rules, config.vars.include_commented))
        .collect();

    Ok((manifests, analyses, issues))
}

/// All service names across a set of manifests.
pub fn service_names(manifests: &[ServiceManifest]) -> BTreeSet<String> {
    manifests
        .iter()
        .flat_map(|m| m.services.keys().cloned())
        .collect()
}

/// Run the full check pipeline over a stack directory.
///
/// The canonical template must exist; everything else degrades to
/// findings inside the returned report.
pub fn run(root: &Path, config: &Config) -> Result<Report> {
    let template_path = Config::resolve_path(root, &config.template.path);
    let template = EnvTemplate::load(&template_path)?;

    let (manifests, analyses, mut issues) = analyze_stack(root, config)?;
    issues.extend(template.issues.iter().cloned());

    // Merge partial results: the aggregate is owned here and nowhere else.
    let mut referenced = BTreeSet::new();
    let mut violations = Vec::new();
    for analysis in analyses {
        referenced.extend(analysis.referenced);
        violations.extend(analysis.violations);
    }

    let drift = drift::analyze(&referenced, &template.names());

    let corpus = DocumentationCorpus::load(root, &config.docs);
    let coverage = docs::check_coverage(&corpus, &service_names(&manifests));

    Ok(Report::assemble(drift, violations, coverage, issues))
}
