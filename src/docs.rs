//! Documentation coverage checking.
//!
//! Every discovered service should be mentioned somewhere in the
//! documentation corpus, and ideally with access information nearby: a
//! URL, a `<service>.<domain>` host, or a phrase pointing at ports or
//! login details. An unmentioned service is a hard finding; a mentioned
//! service without access info is only a warning.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{Config, DocsConfig};

/// Lines scanned on each side of a service mention when looking for an
/// access-info signal.
const ACCESS_WINDOW: usize = 2;

/// One readable source in the corpus.
#[derive(Debug, Clone)]
pub struct DocSource {
    pub path: PathBuf,
    pub text: String,
}

/// The documentation corpus: root doc, nested doc tree, and any
/// per-service documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentationCorpus {
    pub sources: Vec<DocSource>,
}

/// Coverage verdict for one service.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageResult {
    pub service: String,
    pub documented: bool,
    pub has_access_info: bool,
}

impl DocumentationCorpus {
    /// Gather every readable corpus source under the stack root. Missing
    /// documentation is not an error here; it surfaces as uncovered
    /// services in the results.
    pub fn load(root: &Path, docs: &DocsConfig) -> Self {
        let mut seen = BTreeSet::new();
        let mut sources = Vec::new();

        let mut push = |path: PathBuf, sources: &mut Vec<DocSource>| {
            let resolved = path.canonicalize().unwrap_or_else(|_| path.clone());
            if !seen.insert(resolved) {
                return;
            }
            if let Ok(text) = fs::read_to_string(&path) {
                sources.push(DocSource { path, text });
            }
        };

        push(Config::resolve_path(root, &docs.root), &mut sources);

        let tree = Config::resolve_path(root, &docs.dir);
        let pattern = tree.join("**").join("*.md").to_string_lossy().to_string();
        if let Ok(entries) = glob::glob(&pattern) {
            for entry in entries.flatten() {
                if entry.is_file() {
                    push(entry, &mut sources);
                }
            }
        }

        // Per-service documents usually live inside the doc tree, but the
        // directory is configurable independently.
        let service_dir = Config::resolve_path(root, &docs.service_dir);
        let pattern = service_dir.join("*.md").to_string_lossy().to_string();
        if let Ok(entries) = glob::glob(&pattern) {
            for entry in entries.flatten() {
                if entry.is_file() {
                    push(entry, &mut sources);
                }
            }
        }

        sources.sort_by(|a, b| a.path.cmp(&b.path));
        Self { sources }
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Cross-reference each service name against the corpus.
pub fn check_coverage(
    corpus: &DocumentationCorpus,
    services: &BTreeSet<String>,
) -> Vec<CoverageResult> {
    // Lowercase once per source; every lookup is case-insensitive.
    let lowered: Vec<(Vec<String>, String)> = corpus
        .sources
        .iter()
        .map(|s| {
            let lines: Vec<String> = s.text.lines().map(|l| l.to_lowercase()).collect();
            (lines, s.text.to_lowercase())
        })
        .collect();

    services
        .iter()
        .map(|service| {
            let needle = service.to_lowercase();
            let documented = lowered.iter().any(|(_, full)| full.contains(&needle));
            let has_access_info =
                documented && lowered.iter().any(|(lines, _)| mention_has_access_info(lines, &needle));

            CoverageResult {
                service: service.clone(),
                documented,
                has_access_info,
            }
        })
        .collect()
}

/// Scan a window of lines around each mention of the service for an
/// access-info signal.
fn mention_has_access_info(lines: &[String], needle: &str) -> bool {
    for (idx, line) in lines.iter().enumerate() {
        if !line.contains(needle) {
            continue;
        }
        let start = idx.saturating_sub(ACCESS_WINDOW);
        let end = (idx + ACCESS_WINDOW + 1).min(lines.len());
        let window = lines[start..end].join("\n");

        if has_access_signal(&window, needle) {
            return true;
        }
    }
    false
}

fn has_access_signal(window: &str, service: &str) -> bool {
    // URL-like pattern, validated before it counts.
    let url_re = Regex::new(r#"https?://[^\s)>"'`]+"#).unwrap();
    for m in url_re.find_iter(window) {
        if url::Url::parse(m.as_str()).is_ok() {
            return true;
        }
    }

    // Host pattern: `service.` followed by a domain or an interpolation
    // such as `pihole.${DOMAIN}`.
    let host_re = Regex::new(&format!(r"{}\.[a-z0-9$]", regex::escape(service))).unwrap();
    if host_re.is_match(window) {
        return true;
    }

    // Literal access phrasing.
    let phrase_re = Regex::new(r"\b(access|port|login|credentials|url)\b").unwrap();
    phrase_re.is_match(window)
}
