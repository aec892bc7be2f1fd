//! Finding aggregation and report rendering.
//!
//! The aggregator is the only place partial results meet: drift sets,
//! rule violations, coverage verdicts, and input issues are merged into
//! one `Report` with a deterministic display order, so identical inputs
//! always render byte-identical output.

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::docs::CoverageResult;
use crate::drift::DriftReport;
use crate::rules::{RuleViolation, Severity};
use crate::ui::{self, colors, format};

const SECTION_WIDTH: usize = 60;

/// A recovered-local input problem: the file (and line) it came from and
/// what went wrong. Reported, never blocking on its own.
#[derive(Debug, Clone, Serialize)]
pub struct LoadIssue {
    pub path: PathBuf,
    pub line: Option<usize>,
    pub kind: LoadIssueKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadIssueKind {
    ParseError,
    InvalidFormat,
    DuplicateVariable,
}

impl LoadIssue {
    pub fn new(
        path: &Path,
        line: Option<usize>,
        kind: LoadIssueKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            line,
            kind,
            message: message.into(),
        }
    }

    fn location(&self) -> String {
        match self.line {
            Some(line) => format!("{}:{}", self.path.display(), line),
            None => self.path.display().to_string(),
        }
    }
}

/// The merged result of one full run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub drift: DriftReport,
    pub violations: Vec<RuleViolation>,
    pub coverage: Vec<CoverageResult>,
    pub issues: Vec<LoadIssue>,
    pub pass: bool,
}

impl Report {
    /// Merge the partial results of a run. Ordering is fixed here:
    /// violations by severity, then service, then rule id; coverage by
    /// service; issues by path and line.
    pub fn assemble(
        drift: DriftReport,
        mut violations: Vec<RuleViolation>,
        mut coverage: Vec<CoverageResult>,
        mut issues: Vec<LoadIssue>,
    ) -> Self {
        violations.sort_by(|a, b| {
            (a.severity, &a.service, a.rule).cmp(&(b.severity, &b.service, b.rule))
        });
        coverage.sort_by(|a, b| a.service.cmp(&b.service));
        issues.sort_by(|a, b| (&a.path, a.line).cmp(&(&b.path, b.line)));

        let pass = drift.missing.is_empty()
            && !violations.iter().any(|v| v.severity == Severity::Hard)
            && coverage.iter().all(|c| c.documented);

        Self {
            drift,
            violations,
            coverage,
            issues,
            pass,
        }
    }

    pub fn hard_count(&self) -> usize {
        self.drift.missing.len()
            + self
                .violations
                .iter()
                .filter(|v| v.severity == Severity::Hard)
                .count()
            + self.coverage.iter().filter(|c| !c.documented).count()
    }

    pub fn soft_count(&self) -> usize {
        self.drift.unused.len()
            + self
                .violations
                .iter()
                .filter(|v| v.severity == Severity::Soft)
                .count()
            + self
                .coverage
                .iter()
                .filter(|c| c.documented && !c.has_access_info)
                .count()
    }

    /// Full human-readable report.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.render_drift_section());
        out.push('\n');
        out.push_str(&self.render_rules_section());
        out.push('\n');
        out.push_str(&self.render_coverage_section());
        if !self.issues.is_empty() {
            out.push('\n');
            out.push_str(&self.render_issues_section());
        }
        out.push('\n');
        out.push_str(&self.render_summary());
        out
    }

    pub fn render_drift_section(&self) -> String {
        let mut out = section_header("Configuration Drift");

        if self.drift.is_clean() {
            out.push_str(&format!(
                "{} manifests and template agree\n",
                ui::ok_icon()
            ));
            return out;
        }

        for name in &self.drift.missing {
            out.push_str(&format!(
                "{} missing  {}  {}\n",
                ui::severity_icon(Severity::Hard),
                colors::identifier(name),
                colors::secondary("referenced in manifests, not declared in template"),
            ));
        }
        for name in &self.drift.unused {
            out.push_str(&format!(
                "{} unused   {}  {}\n",
                ui::severity_icon(Severity::Soft),
                colors::identifier(name),
                colors::secondary("declared in template, never referenced"),
            ));
        }
        out
    }

    pub fn render_rules_section(&self) -> String {
        let mut out = section_header("Service Rules");

        if self.violations.is_empty() {
            out.push_str(&format!(
                "{} all services satisfy the rule set\n",
                ui::ok_icon()
            ));
            return out;
        }

        // Already sorted hard-first by assemble().
        for v in &self.violations {
            out.push_str(&format!(
                "{} {}: {} {}\n",
                ui::severity_icon(v.severity),
                colors::identifier(&v.service),
                v.message,
                colors::secondary(&format!("({})", v.rule)),
            ));
        }
        out
    }

    pub fn render_coverage_section(&self) -> String {
        let mut out = section_header("Documentation Coverage");

        if self.coverage.is_empty() {
            out.push_str(&format!(
                "{} no services discovered\n",
                colors::secondary("·")
            ));
            return out;
        }

        for c in &self.coverage {
            if !c.documented {
                out.push_str(&format!(
                    "{} {}: not mentioned anywhere in the documentation\n",
                    ui::severity_icon(Severity::Hard),
                    colors::identifier(&c.service),
                ));
            } else if !c.has_access_info {
                out.push_str(&format!(
                    "{} {}: documented, but no access info found near any mention\n",
                    ui::severity_icon(Severity::Soft),
                    colors::identifier(&c.service),
                ));
            } else {
                out.push_str(&format!(
                    "{} {}\n",
                    ui::ok_icon(),
                    colors::identifier(&c.service)
                ));
            }
        }
        out
    }

    pub fn render_issues_section(&self) -> String {
        let mut out = section_header("Input Issues");

        for issue in &self.issues {
            out.push_str(&format!(
                "{} {}: {}\n",
                ui::severity_icon(Severity::Soft),
                colors::secondary(&issue.location()),
                issue.message,
            ));
        }
        out
    }

    pub fn render_summary(&self) -> String {
        let hard = self.hard_count();
        let soft = self.soft_count();

        let mut out = format!(
            "Summary: {}, {}",
            format::count(hard, "hard finding", "hard findings"),
            format::count(soft, "soft finding", "soft findings"),
        );
        if !self.issues.is_empty() {
            out.push_str(&format!(
                ", {}",
                format::count(self.issues.len(), "input issue", "input issues")
            ));
        }
        out.push('\n');

        if self.pass {
            out.push_str(&format!("Result: {}\n", colors::success("PASS")));
        } else {
            out.push_str(&format!("Result: {}\n", colors::error("FAIL")));
        }
        out
    }

    /// Machine-readable rendering of the same findings.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn section_header(title: &str) -> String {
    format!(
        "{}\n{}\n",
        colors::heading(title),
        format::separator(SECTION_WIDTH)
    )
}
