//! Variable token extraction.
//!
//! Manifests interpolate configuration through `${NAME}` and
//! `${NAME:-default}` tokens. Extraction is textual: names must match the
//! uppercase identifier convention, inline defaults are captured but never
//! evaluated, and malformed tokens are skipped rather than reported.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::manifest::ServiceManifest;

/// Interpolation token pattern: `${NAME}` or `${NAME:-default}`.
const TOKEN_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}";

/// One variable reference found in a manifest.
#[derive(Debug, Clone)]
pub struct VariableToken {
    pub name: String,
    /// Inline fallback value, informational only.
    pub default: Option<String>,
    pub manifest: PathBuf,
}

/// Extract every variable token from a manifest's raw text.
///
/// With `include_commented` false, lines whose first non-whitespace
/// character is `#` are excluded from the scan.
pub fn extract_tokens(manifest: &ServiceManifest, include_commented: bool) -> Vec<VariableToken> {
    scan_text(&manifest.raw, include_commented)
        .into_iter()
        .map(|(name, default)| VariableToken {
            name,
            default,
            manifest: manifest.path.clone(),
        })
        .collect()
}

/// Deduplicated set of variable names referenced by a group of tokens.
pub fn referenced_names<'a, I>(tokens: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a VariableToken>,
{
    tokens.into_iter().map(|t| t.name.clone()).collect()
}

/// Per-service attribution: the names referenced inside each service's
/// declaration block.
pub fn tokens_by_service(
    manifest: &ServiceManifest,
    include_commented: bool,
) -> BTreeMap<String, BTreeSet<String>> {
    manifest
        .services
        .values()
        .map(|block| {
            let names = scan_text(&block.body, include_commented)
                .into_iter()
                .map(|(name, _)| name)
                .collect();
            (block.name.clone(), names)
        })
        .collect()
}

fn scan_text(text: &str, include_commented: bool) -> Vec<(String, Option<String>)> {
    let re = Regex::new(TOKEN_PATTERN).unwrap();
    let mut found = Vec::new();

    for line in text.lines() {
        if !include_commented && line.trim_start().starts_with('#') {
            continue;
        }
        for caps in re.captures_iter(line) {
            let name = caps[1].to_string();
            let default = caps.get(2).map(|m| m.as_str().to_string());
            found.push((name, default));
        }
    }

    found
}
