//! Canonical environment template parsing.
//!
//! The template (`.env.example` by convention) is the baseline every
//! manifest is checked against. A missing or unreadable template is the
//! one fatal precondition of a run; individual bad lines are recorded as
//! load issues and parsing continues.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::report::{LoadIssue, LoadIssueKind};

/// Variable names follow the uppercase shell identifier convention.
const NAME_PATTERN: &str = r"^[A-Z_][A-Z0-9_]*$";

/// One declared variable: name, the raw line it came from, and its
/// 1-based line number.
#[derive(Debug, Clone)]
pub struct TemplateEntry {
    pub name: String,
    pub raw: String,
    pub line: usize,
}

/// The parsed template: declaration order preserved, duplicates and
/// malformed lines surfaced as issues.
#[derive(Debug, Clone)]
pub struct EnvTemplate {
    pub path: PathBuf,
    pub entries: Vec<TemplateEntry>,
    pub issues: Vec<LoadIssue>,
}

impl EnvTemplate {
    /// Load and parse the template file. Read failure is fatal: without a
    /// baseline there is nothing to check against.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| {
            format!("Cannot read canonical template {}", path.display())
        })?;

        Ok(Self::parse(path, &content))
    }

    /// Parse template content line by line. Never fails: format problems
    /// become issues attached to the result.
    pub fn parse(path: &Path, content: &str) -> Self {
        let name_re = Regex::new(NAME_PATTERN).unwrap();
        let mut entries: Vec<TemplateEntry> = Vec::new();
        let mut seen = BTreeSet::new();
        let mut issues = Vec::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let name = match trimmed.split_once('=') {
                Some((lhs, _)) => lhs.trim(),
                None => {
                    issues.push(LoadIssue::new(
                        path,
                        Some(line),
                        LoadIssueKind::InvalidFormat,
                        format!("Not a KEY=value line: '{}'", trimmed),
                    ));
                    continue;
                }
            };

            if !name_re.is_match(name) {
                issues.push(LoadIssue::new(
                    path,
                    Some(line),
                    LoadIssueKind::InvalidFormat,
                    format!("Invalid variable name '{}'", name),
                ));
                continue;
            }

            if !seen.insert(name.to_string()) {
                issues.push(LoadIssue::new(
                    path,
                    Some(line),
                    LoadIssueKind::DuplicateVariable,
                    format!("Duplicate variable '{}'", name),
                ));
                continue;
            }

            entries.push(TemplateEntry {
                name: name.to_string(),
                raw: raw.to_string(),
                line,
            });
        }

        Self {
            path: path.to_path_buf(),
            entries,
            issues,
        }
    }

    /// The deduplicated set of declared variable names.
    pub fn names(&self) -> BTreeSet<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }
}
