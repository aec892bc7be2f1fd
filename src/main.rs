//! CLI entry point and command handlers for stackcheck.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use stackcheck::cli::{Cli, Commands};
use stackcheck::config::Config;
use stackcheck::docs::{self, DocumentationCorpus};
use stackcheck::report::Report;
use stackcheck::rules::Severity;
use stackcheck::template::EnvTemplate;
use stackcheck::ui::{self, colors};
use stackcheck::{check, drift, vars};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Plain output when stdout is not a terminal.
    if !atty::is(atty::Stream::Stdout) {
        colored::control::set_override(false);
    }

    let quiet = cli.quiet || ui::is_quiet();
    let root = cli.root;

    match cli.command.unwrap_or(Commands::Check { json: false }) {
        Commands::Check { json } => cmd_check(&root, json, quiet),
        Commands::Drift => cmd_drift(&root),
        Commands::Audit => cmd_audit(&root),
        Commands::Docs => cmd_docs(&root),
        Commands::Services => cmd_services(&root),
        Commands::Vars => cmd_vars(&root),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Version { verbose } => cmd_version(verbose),
    }
}

/// Full pipeline: drift, rules, coverage, one report, pass/fail exit.
fn cmd_check(root: &Path, json: bool, quiet: bool) -> Result<()> {
    let config = Config::load(root)?;
    let report = check::run(root, &config)?;

    if json {
        println!("{}", report.to_json()?);
    } else if quiet {
        print!("{}", report.render_summary());
    } else {
        print!("{}", report.render());
    }

    if !report.pass {
        std::process::exit(1);
    }
    Ok(())
}

/// Drift section only. The template is still required; exit 1 when any
/// referenced variable is undeclared.
fn cmd_drift(root: &Path) -> Result<()> {
    let config = Config::load(root)?;
    let template = EnvTemplate::load(&Config::resolve_path(root, &config.template.path))?;
    let (_, analyses, mut issues) = check::analyze_stack(root, &config)?;
    issues.extend(template.issues.iter().cloned());

    let mut referenced = std::collections::BTreeSet::new();
    for analysis in analyses {
        referenced.extend(analysis.referenced);
    }

    let report = Report::assemble(
        drift::analyze(&referenced, &template.names()),
        vec![],
        vec![],
        issues,
    );

    print!("{}", report.render_drift_section());
    if !report.issues.is_empty() {
        println!();
        print!("{}", report.render_issues_section());
    }

    if !report.drift.missing.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

/// Rule engine section only; exit 1 on any hard violation.
fn cmd_audit(root: &Path) -> Result<()> {
    let config = Config::load(root)?;
    let (_, analyses, issues) = check::analyze_stack(root, &config)?;

    let violations: Vec<_> = analyses.into_iter().flat_map(|a| a.violations).collect();
    let report = Report::assemble(Default::default(), violations, vec![], issues);

    print!("{}", report.render_rules_section());
    if !report.issues.is_empty() {
        println!();
        print!("{}", report.render_issues_section());
    }

    let has_hard = report
        .violations
        .iter()
        .any(|v| v.severity == Severity::Hard);
    if has_hard {
        std::process::exit(1);
    }
    Ok(())
}

/// Coverage section only; exit 1 when any service is undocumented.
fn cmd_docs(root: &Path) -> Result<()> {
    let config = Config::load(root)?;
    let (manifests, _, issues) = check::analyze_stack(root, &config)?;

    let corpus = DocumentationCorpus::load(root, &config.docs);
    let coverage = docs::check_coverage(&corpus, &check::service_names(&manifests));
    let report = Report::assemble(Default::default(), vec![], coverage, issues);

    print!("{}", report.render_coverage_section());

    if report.coverage.iter().any(|c| !c.documented) {
        std::process::exit(1);
    }
    Ok(())
}

/// List every discovered service, grouped by manifest.
fn cmd_services(root: &Path) -> Result<()> {
    let config = Config::load(root)?;
    let (manifests, _, issues) = check::analyze_stack(root, &config)?;

    if manifests.is_empty() {
        println!("No manifests found.");
    }

    for manifest in &manifests {
        println!("{}", colors::secondary(&manifest.path.display().to_string()));
        for name in manifest.services.keys() {
            println!("  {} {}", "●".green(), colors::identifier(name));
        }
    }

    for issue in &issues {
        eprintln!("{} {}: {}", "⚠".yellow(), issue.path.display(), issue.message);
    }
    Ok(())
}

/// List referenced variables with inline defaults and, when the template
/// is readable, their declaration status.
fn cmd_vars(root: &Path) -> Result<()> {
    let config = Config::load(root)?;
    let (manifests, _, _) = check::analyze_stack(root, &config)?;

    // name -> first inline default seen
    let mut defaults: BTreeMap<String, Option<String>> = BTreeMap::new();
    for manifest in &manifests {
        for token in vars::extract_tokens(manifest, config.vars.include_commented) {
            let entry = defaults.entry(token.name).or_insert(None);
            if entry.is_none() {
                *entry = token.default;
            }
        }
    }

    if defaults.is_empty() {
        println!("No variable references found.");
        return Ok(());
    }

    let declared = EnvTemplate::load(&Config::resolve_path(root, &config.template.path))
        .ok()
        .map(|t| t.names());

    for (name, default) in &defaults {
        let marker = match &declared {
            Some(names) if names.contains(name) => ui::ok_icon(),
            Some(_) => "✗".red(),
            None => "·".normal(),
        };
        let mut line = format!("{} {}", marker, colors::identifier(name));
        if let Some(value) = default {
            line.push_str(&format!("  {}", colors::secondary(&format!("(default: {})", value))));
        }
        println!("{}", line);
    }

    if declared.is_none() {
        println!(
            "{}",
            colors::secondary("Template not readable; declaration status not shown.")
        );
    }
    Ok(())
}

/// Generate shell completion script
fn cmd_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "stackcheck", &mut io::stdout());
    Ok(())
}

fn cmd_version(verbose: bool) -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    println!("stackcheck {}", VERSION);

    if verbose {
        const GIT_SHA: &str = env!("GIT_SHA");
        println!("commit: {}", GIT_SHA);
    }

    Ok(())
}
