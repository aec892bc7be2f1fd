//! # Stackcheck - Configuration Drift and Compliance Checking
//!
//! Stackcheck is a read-only checker for compose-based service stacks. It
//! cross-references the configuration variables your manifests interpolate
//! against the canonical `.env.example` template, evaluates structural
//! best-practice rules per service, and verifies every service is
//! discoverable in the documentation corpus.
//!
//! ## Overview
//!
//! A run is a single batch pass over local text files: manifests are
//! discovered and split into per-service declaration blocks, variable
//! tokens are extracted, the template is parsed into an ordered variable
//! set, and the aggregator merges drift, rule, and coverage findings into
//! one severity-coded report with a pass/fail verdict.
//!
//! ## Core Concepts
//!
//! - **Drift**: divergence between variables referenced by manifests and
//!   variables declared in the canonical template
//! - **Hard findings**: missing variables, hard rule violations, and
//!   undocumented services; any of these forces a non-zero exit
//! - **Soft findings**: unused variables, soft rule violations, and
//!   missing access info; reported but never blocking
//!
//! ## Modules
//!
//! - [`manifest`] - Manifest discovery and service block extraction
//! - [`vars`] - Variable token extraction
//! - [`template`] - Canonical environment template parsing
//! - [`drift`] - Missing/unused variable analysis
//! - [`rules`] - Best-practice rule engine
//! - [`docs`] - Documentation coverage checking
//! - [`report`] - Finding aggregation and rendering
//! - [`check`] - Full pipeline orchestration
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use stackcheck::check;
//! use stackcheck::config::Config;
//!
//! let root = Path::new(".");
//! let config = Config::load(root).expect("Failed to load config");
//! let report = check::run(root, &config).expect("Check failed");
//!
//! if report.pass {
//!     println!("stack is clean");
//! }
//! ```

// Re-export all public modules
pub mod check;
pub mod cli;
pub mod config;
pub mod docs;
pub mod drift;
pub mod manifest;
pub mod report;
pub mod rules;
pub mod template;
pub mod ui;
pub mod vars;

/// Default path constants for a stack directory.
pub mod paths {
    /// Canonical environment template at the stack root: `.env.example`
    pub const ENV_TEMPLATE: &str = ".env.example";
    /// Root document of the documentation corpus: `README.md`
    pub const ROOT_DOC: &str = "README.md";
    /// Nested documentation tree: `docs`
    pub const DOCS_DIR: &str = "docs";
    /// Per-service documents: `docs/services`
    pub const SERVICE_DOCS_DIR: &str = "docs/services";
    /// Optional run configuration: `stackcheck.yml`
    pub const CONFIG_FILE: &str = "stackcheck.yml";
}
