//! Best-practice rule engine.
//!
//! Each rule inspects the text of a single service declaration block and
//! either passes or yields one violation with a fixed severity. Rules are
//! independent trait objects behind an open registry: adding a rule means
//! adding a type here and listing it in [`builtin_rules`], nothing in the
//! extraction or reporting code changes.

use serde::Serialize;

use crate::manifest::ServiceBlock;

/// Finding severity. Hard findings block overall success; soft findings
/// are informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Hard,
    Soft,
}

/// One rule violation for one service.
#[derive(Debug, Clone, Serialize)]
pub struct RuleViolation {
    pub service: String,
    pub rule: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// A single structural check over one service block.
pub trait Rule {
    fn id(&self) -> &'static str;
    fn severity(&self) -> Severity;
    fn check(&self, block: &ServiceBlock) -> Option<RuleViolation>;

    /// Build a violation carrying this rule's identity.
    fn violation(&self, block: &ServiceBlock, message: impl Into<String>) -> RuleViolation
    where
        Self: Sized,
    {
        RuleViolation {
            service: block.name.clone(),
            rule: self.id(),
            severity: self.severity(),
            message: message.into(),
        }
    }
}

/// All built-in rules, minus any whose id appears in `disable`.
pub fn registry(disable: &[String]) -> Vec<Box<dyn Rule>> {
    builtin_rules()
        .into_iter()
        .filter(|rule| !disable.iter().any(|d| d == rule.id()))
        .collect()
}

fn builtin_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(MissingRestartPolicy),
        Box::new(MissingContainerIdentity),
        Box::new(MissingHealthcheck),
        Box::new(MissingSecurityHardening),
        Box::new(InconsistentRoutingLabels),
        Box::new(UnpinnedImage),
        Box::new(PrivilegedContainer),
    ]
}

/// Run every registered rule against one block. All violations are
/// retained; rules never short-circuit each other.
pub fn evaluate(block: &ServiceBlock, rules: &[Box<dyn Rule>]) -> Vec<RuleViolation> {
    rules.iter().filter_map(|rule| rule.check(block)).collect()
}

/// True when any line of the block declares the given YAML key.
fn has_field(body: &str, key: &str) -> bool {
    body.lines().any(|line| {
        let trimmed = line.trim_start();
        trimmed.starts_with(&format!("{}:", key))
    })
}

/// The value of the block's `image:` line, quotes stripped.
fn image_ref(body: &str) -> Option<String> {
    body.lines().find_map(|line| {
        let trimmed = line.trim_start();
        let value = trimmed.strip_prefix("image:")?;
        Some(
            value
                .trim()
                .trim_matches(|c| c == '"' || c == '\'')
                .to_string(),
        )
    })
}

/// The tag of an image reference, accounting for registry hosts with
/// ports (`registry.local:5000/app` has no tag).
fn image_tag(image: &str) -> Option<String> {
    let after_registry = match image.split_once('/') {
        Some((first, rest)) if first.contains('.') || first.contains(':') => rest,
        _ => image,
    };
    let (_, tag) = after_registry.rsplit_once(':')?;
    Some(tag.to_string())
}

struct MissingRestartPolicy;

impl Rule for MissingRestartPolicy {
    fn id(&self) -> &'static str {
        "missing-restart-policy"
    }

    fn severity(&self) -> Severity {
        Severity::Soft
    }

    fn check(&self, block: &ServiceBlock) -> Option<RuleViolation> {
        if has_field(&block.body, "restart") {
            None
        } else {
            Some(self.violation(block, "no restart policy configured"))
        }
    }
}

struct MissingContainerIdentity;

impl Rule for MissingContainerIdentity {
    fn id(&self) -> &'static str {
        "missing-container-identity"
    }

    fn severity(&self) -> Severity {
        Severity::Soft
    }

    fn check(&self, block: &ServiceBlock) -> Option<RuleViolation> {
        if has_field(&block.body, "container_name") {
            None
        } else {
            Some(self.violation(block, "no explicit container_name"))
        }
    }
}

struct MissingHealthcheck;

impl Rule for MissingHealthcheck {
    fn id(&self) -> &'static str {
        "missing-healthcheck"
    }

    fn severity(&self) -> Severity {
        Severity::Soft
    }

    fn check(&self, block: &ServiceBlock) -> Option<RuleViolation> {
        if has_field(&block.body, "healthcheck") {
            None
        } else {
            Some(self.violation(block, "no healthcheck defined"))
        }
    }
}

struct MissingSecurityHardening;

impl Rule for MissingSecurityHardening {
    fn id(&self) -> &'static str {
        "missing-security-hardening"
    }

    fn severity(&self) -> Severity {
        Severity::Soft
    }

    fn check(&self, block: &ServiceBlock) -> Option<RuleViolation> {
        if block.body.contains("no-new-privileges") {
            None
        } else {
            Some(self.violation(
                block,
                "missing 'no-new-privileges' security option",
            ))
        }
    }
}

struct InconsistentRoutingLabels;

impl Rule for InconsistentRoutingLabels {
    fn id(&self) -> &'static str {
        "inconsistent-routing-labels"
    }

    fn severity(&self) -> Severity {
        Severity::Hard
    }

    fn check(&self, block: &ServiceBlock) -> Option<RuleViolation> {
        let has_labels = block.body.contains("traefik.");
        let enabled = block.body.contains("traefik.enable=true");

        if has_labels && !enabled {
            Some(self.violation(
                block,
                "traefik labels present but 'traefik.enable=true' is missing",
            ))
        } else {
            None
        }
    }
}

struct UnpinnedImage;

impl Rule for UnpinnedImage {
    fn id(&self) -> &'static str {
        "unpinned-image"
    }

    fn severity(&self) -> Severity {
        Severity::Soft
    }

    fn check(&self, block: &ServiceBlock) -> Option<RuleViolation> {
        let image = image_ref(&block.body)?;
        match image_tag(&image).as_deref() {
            None => Some(self.violation(
                block,
                format!("image '{}' has no tag (implies latest)", image),
            )),
            Some("latest") => {
                Some(self.violation(block, format!("image '{}' uses the latest tag", image)))
            }
            Some(_) => None,
        }
    }
}

struct PrivilegedContainer;

impl Rule for PrivilegedContainer {
    fn id(&self) -> &'static str {
        "privileged-container"
    }

    fn severity(&self) -> Severity {
        Severity::Soft
    }

    fn check(&self, block: &ServiceBlock) -> Option<RuleViolation> {
        let privileged = block.body.lines().any(|line| {
            let trimmed = line.trim();
            trimmed == "privileged: true" || trimmed == "privileged: \"true\""
        });

        if privileged {
            Some(self.violation(block, "container runs in privileged mode"))
        } else {
            None
        }
    }
}
