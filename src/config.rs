//! Configuration for stackcheck runs.
//!
//! Configuration is optional: a run with no `stackcheck.yml` at the stack
//! root uses the defaults below, which match the layout of a conventional
//! compose-based homelab repository.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// Which service-block parser the manifest loader uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// Structured parse of the top-level `services` mapping (preferred).
    #[default]
    Yaml,
    /// Line/indentation heuristic, tolerant of slightly malformed files.
    Indent,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub template: TemplateConfig,
    pub vars: VarsConfig,
    pub docs: DocsConfig,
    pub rules: RulesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Manifest filename patterns, matched at the root and recursively.
    pub include: Vec<String>,
    /// Path segments that exclude a file from scanning.
    pub exclude_markers: Vec<String>,
    /// Service-block parser selection.
    pub parser: ParserKind,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude_markers: vec!["template".to_string()],
            parser: ParserKind::default(),
        }
    }
}

fn default_include() -> Vec<String> {
    [
        "docker-compose*.yml",
        "docker-compose*.yaml",
        "compose.yml",
        "compose.yaml",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Canonical environment template, relative to the stack root.
    pub path: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            path: paths::ENV_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VarsConfig {
    /// Whether `${VAR}` references on commented-out manifest lines count
    /// as referenced. Defaults to true.
    pub include_commented: bool,
}

impl Default for VarsConfig {
    fn default() -> Self {
        Self {
            include_commented: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Root document of the corpus.
    pub root: String,
    /// Nested documentation tree, searched recursively for markdown.
    pub dir: String,
    /// Directory holding one optional document per service.
    pub service_dir: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            root: paths::ROOT_DOC.to_string(),
            dir: paths::DOCS_DIR.to_string(),
            service_dir: paths::SERVICE_DOCS_DIR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Rule ids to skip during evaluation.
    pub disable: Vec<String>,
}

impl Config {
    /// Load configuration from `stackcheck.yml` at the stack root, falling
    /// back to defaults when the file does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        Self::load_from(&root.join(paths::CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Resolve a configured path against the stack root, expanding a
    /// leading tilde first.
    pub fn resolve_path(root: &Path, configured: &str) -> PathBuf {
        let expanded = shellexpand::tilde(configured);
        let path = Path::new(expanded.as_ref());
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }
}
