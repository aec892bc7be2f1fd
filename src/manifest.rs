//! Manifest discovery and service block extraction.
//!
//! Manifests are compose files found recursively under the stack root.
//! Each one is split into per-service declaration blocks: contiguous text
//! spans that the rule engine and the variable extractor inspect. Block
//! extraction is parser-agnostic: both the structured YAML parser and the
//! line/indentation heuristic implement the same [`BlockParser`] contract,
//! so the rest of the pipeline never cares which one produced the blocks.

use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::{ParserKind, ScanConfig};
use crate::report::{LoadIssue, LoadIssueKind};

/// One service's declaration block: its name and the contiguous span of
/// manifest text that defines it.
#[derive(Debug, Clone)]
pub struct ServiceBlock {
    pub name: String,
    pub body: String,
}

/// A parsed manifest file. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct ServiceManifest {
    pub path: PathBuf,
    pub raw: String,
    pub services: BTreeMap<String, ServiceBlock>,
}

/// Contract shared by both block parsers: raw manifest text in, the
/// mapping from service name to declaration block out.
pub trait BlockParser {
    fn parse(&self, raw: &str) -> Result<BTreeMap<String, ServiceBlock>>;
}

/// Structured parser: validates the document as YAML and takes the service
/// set from the top-level `services` mapping. Block text is recovered as
/// the matching line span of the raw document so rules see the original
/// source, comments and label formatting included.
pub struct YamlBlockParser;

impl BlockParser for YamlBlockParser {
    fn parse(&self, raw: &str) -> Result<BTreeMap<String, ServiceBlock>> {
        let doc: serde_yaml::Value =
            serde_yaml::from_str(raw).context("Invalid YAML")?;

        let services = doc
            .get("services")
            .and_then(|v| v.as_mapping())
            .ok_or_else(|| anyhow!("No top-level 'services' mapping"))?;

        let spans = service_spans(raw);
        let mut blocks = BTreeMap::new();

        for (key, value) in services {
            let name = key
                .as_str()
                .ok_or_else(|| anyhow!("Non-string service name"))?
                .to_string();

            // Prefer the raw text span; reserialize only when the span scan
            // cannot locate the key (unusual quoting or flow style).
            let body = match spans.get(&name) {
                Some(span) => span.clone(),
                None => serde_yaml::to_string(value)
                    .with_context(|| format!("Failed to reserialize service '{}'", name))?,
            };

            blocks.insert(name.clone(), ServiceBlock { name, body });
        }

        Ok(blocks)
    }
}

/// Heuristic parser: first-indent-level keys directly under a `services:`
/// line, each block ending at the next key at the same or lower indent.
pub struct IndentBlockParser;

impl BlockParser for IndentBlockParser {
    fn parse(&self, raw: &str) -> Result<BTreeMap<String, ServiceBlock>> {
        let spans = service_spans(raw);
        if spans.is_empty() {
            return Err(anyhow!("No service blocks found under 'services:'"));
        }

        Ok(spans
            .into_iter()
            .map(|(name, body)| (name.clone(), ServiceBlock { name, body }))
            .collect())
    }
}

/// Return the parser selected by configuration.
pub fn parser_for(kind: ParserKind) -> Box<dyn BlockParser> {
    match kind {
        ParserKind::Yaml => Box::new(YamlBlockParser),
        ParserKind::Indent => Box::new(IndentBlockParser),
    }
}

/// Scan raw manifest text for the line spans of each service declared
/// under the top-level `services:` key.
fn service_spans(raw: &str) -> BTreeMap<String, String> {
    let lines: Vec<&str> = raw.lines().collect();
    let mut spans = BTreeMap::new();

    // Locate the top-level services key.
    let services_line = lines
        .iter()
        .position(|l| l.trim_end() == "services:" && !l.starts_with(char::is_whitespace));
    let start = match services_line {
        Some(idx) => idx + 1,
        None => return spans,
    };

    // The first non-blank, non-comment line after `services:` fixes the
    // service-key indentation level.
    let mut service_indent = None;
    for line in &lines[start..] {
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let indent = indent_of(line);
        if indent == 0 {
            // Next top-level key; empty services section.
            return spans;
        }
        service_indent = Some(indent);
        break;
    }
    let service_indent = match service_indent {
        Some(i) => i,
        None => return spans,
    };

    let mut current: Option<(String, usize)> = None;
    let mut end_of_section = lines.len();

    for (offset, line) in lines[start..].iter().enumerate() {
        let idx = start + offset;
        if line.trim().is_empty() {
            continue;
        }
        let indent = indent_of(line);

        if indent == 0 {
            // Left the services section entirely.
            end_of_section = idx;
            if let Some((name, begin)) = current.take() {
                spans.insert(name, lines[begin..idx].join("\n"));
            }
            break;
        }

        if indent == service_indent && !line.trim_start().starts_with('#') {
            if let Some(key) = service_key(line) {
                if let Some((name, begin)) = current.take() {
                    spans.insert(name, lines[begin..idx].join("\n"));
                }
                current = Some((key, idx));
            }
        }
    }

    if let Some((name, begin)) = current {
        spans.insert(name, lines[begin..end_of_section].join("\n"));
    }

    spans
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Extract the key of a `name:` line, stripping optional quotes.
fn service_key(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let key = trimmed.strip_suffix(':')?;
    if key.is_empty() || key.contains(' ') {
        return None;
    }
    Some(key.trim_matches(|c| c == '"' || c == '\'').to_string())
}

/// Enumerate candidate manifest files under the root: each configured
/// pattern is matched at the root and recursively, and any path with a
/// segment containing an exclude marker is dropped.
pub fn discover_manifests(root: &Path, scan: &ScanConfig) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for pattern in &scan.include {
        for full in [
            root.join(pattern),
            root.join("**").join(pattern),
        ] {
            let pattern_str = full.to_string_lossy().to_string();
            for entry in glob::glob(&pattern_str)
                .with_context(|| format!("Invalid scan pattern: {}", pattern_str))?
                .flatten()
            {
                if entry.is_file() && !is_excluded(&entry, &scan.exclude_markers) {
                    found.push(entry);
                }
            }
        }
    }

    // Deduplicate by resolved path; keep a stable lexicographic order.
    let mut seen = std::collections::BTreeMap::new();
    for path in found {
        let resolved = path.canonicalize().unwrap_or_else(|_| path.clone());
        seen.entry(resolved).or_insert(path);
    }

    Ok(seen.into_values().collect())
}

fn is_excluded(path: &Path, markers: &[String]) -> bool {
    path.components().any(|component| {
        let segment = component.as_os_str().to_string_lossy().to_lowercase();
        markers
            .iter()
            .any(|marker| segment.contains(&marker.to_lowercase()))
    })
}

/// Load every discovered manifest. Per-file read or parse failures are
/// recorded as load issues; the remaining files are still processed.
pub fn load_manifests(
    root: &Path,
    scan: &ScanConfig,
) -> Result<(Vec<ServiceManifest>, Vec<LoadIssue>)> {
    let parser = parser_for(scan.parser);
    let mut manifests = Vec::new();
    let mut issues = Vec::new();

    for path in discover_manifests(root, scan)? {
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                issues.push(LoadIssue::new(
                    &path,
                    None,
                    LoadIssueKind::ParseError,
                    format!("Cannot read manifest: {}", e),
                ));
                continue;
            }
        };

        match parser.parse(&raw) {
            Ok(services) => manifests.push(ServiceManifest {
                path,
                raw,
                services,
            }),
            Err(e) => issues.push(LoadIssue::new(
                &path,
                None,
                LoadIssueKind::ParseError,
                format!("Failed to parse manifest: {:#}", e),
            )),
        }
    }

    Ok((manifests, issues))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const COMPOSE: &str = r#"services:
  traefik:
    image: traefik:v3.0
    restart: unless-stopped
    # reverse proxy entrypoint
    labels:
      - "traefik.enable=true"
  pihole:
    image: pihole/pihole:2024.05.0
    environment:
      - TZ=${TZ}

networks:
  homelab_net:
    driver: bridge
"#;

    #[test]
    fn test_yaml_parser_extracts_services() {
        let blocks = YamlBlockParser.parse(COMPOSE).unwrap();
        assert_eq!(blocks.len(), 2);
        assert!(blocks.contains_key("traefik"));
        assert!(blocks.contains_key("pihole"));
    }

    #[test]
    fn test_yaml_parser_block_is_raw_span() {
        let blocks = YamlBlockParser.parse(COMPOSE).unwrap();
        let traefik = &blocks["traefik"];
        assert!(traefik.body.contains("# reverse proxy entrypoint"));
        assert!(traefik.body.contains("traefik.enable=true"));
        assert!(!traefik.body.contains("pihole"));
    }

    #[test]
    fn test_indent_parser_matches_yaml_parser_on_well_formed_input() {
        let from_yaml = YamlBlockParser.parse(COMPOSE).unwrap();
        let from_indent = IndentBlockParser.parse(COMPOSE).unwrap();

        let yaml_names: Vec<&String> = from_yaml.keys().collect();
        let indent_names: Vec<&String> = from_indent.keys().collect();
        assert_eq!(yaml_names, indent_names);
        assert_eq!(from_yaml["pihole"].body, from_indent["pihole"].body);
    }

    #[test]
    fn test_block_ends_before_next_top_level_key() {
        let blocks = IndentBlockParser.parse(COMPOSE).unwrap();
        assert!(!blocks["pihole"].body.contains("homelab_net"));
    }

    #[test]
    fn test_yaml_parser_rejects_invalid_yaml() {
        assert!(YamlBlockParser.parse("services:\n  x: [unclosed").is_err());
    }

    #[test]
    fn test_yaml_parser_requires_services_key() {
        assert!(YamlBlockParser.parse("volumes:\n  data: {}\n").is_err());
    }

    #[test]
    fn test_indent_parser_tolerates_sloppy_values() {
        // Not a structural problem for the heuristic: it only looks at keys.
        let raw = "services:\n  app:\n    command: echo: odd\n";
        let blocks = IndentBlockParser.parse(raw).unwrap();
        assert!(blocks.contains_key("app"));
    }

    #[test]
    fn test_discover_excludes_template_paths() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("templates")).unwrap();
        fs::create_dir_all(tmp.path().join("stacks/media")).unwrap();
        fs::write(tmp.path().join("docker-compose.yml"), COMPOSE).unwrap();
        fs::write(
            tmp.path().join("stacks/media/docker-compose.yml"),
            COMPOSE,
        )
        .unwrap();
        fs::write(
            tmp.path().join("templates/docker-compose.yml"),
            COMPOSE,
        )
        .unwrap();

        let scan = ScanConfig::default();
        let found = discover_manifests(tmp.path(), &scan).unwrap();

        assert_eq!(found.len(), 2);
        assert!(found
            .iter()
            .all(|p| !p.to_string_lossy().contains("templates")));
    }

    #[test]
    fn test_load_isolates_parse_failures() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("docker-compose.yml"), COMPOSE).unwrap();
        fs::write(
            tmp.path().join("docker-compose.broken.yml"),
            "services:\n  x: [unclosed",
        )
        .unwrap();

        let scan = ScanConfig::default();
        let (manifests, issues) = load_manifests(tmp.path(), &scan).unwrap();

        assert_eq!(manifests.len(), 1);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, LoadIssueKind::ParseError);
    }

    #[test]
    fn test_service_key_strips_quotes() {
        assert_eq!(service_key("  \"db\":"), Some("db".to_string()));
        assert_eq!(service_key("  app:"), Some("app".to_string()));
        assert_eq!(service_key("  image: nginx"), None);
    }
}
