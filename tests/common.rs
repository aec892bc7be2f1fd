//! Common fixture helpers for integration tests

use std::fs;
use std::path::Path;

/// A service block that satisfies every built-in rule and is fully
/// covered by `write_readme`.
pub const HARDENED_PIHOLE: &str = r#"  pihole:
    image: pihole/pihole:2024.05.0
    container_name: pihole
    restart: unless-stopped
    security_opt:
      - no-new-privileges:true
    healthcheck:
      test: ["CMD", "dig", "pi.hole", "@127.0.0.1"]
    environment:
      - TZ=${TZ}
      - DOMAIN=${DOMAIN}
    labels:
      - "traefik.enable=true"
      - "traefik.http.routers.pihole.rule=Host(`pihole.${DOMAIN}`)"
"#;

/// Write a compose manifest with the given service blocks.
pub fn write_compose(dir: &Path, filename: &str, blocks: &[&str]) {
    let mut content = String::from("services:\n");
    for block in blocks {
        content.push_str(block);
    }
    fs::write(dir.join(filename), content).unwrap();
}

/// Write the canonical template with one KEY=value line per entry.
pub fn write_template(dir: &Path, lines: &[&str]) {
    fs::write(dir.join(".env.example"), lines.join("\n") + "\n").unwrap();
}

/// Write a README that documents the given services with access info.
pub fn write_readme(dir: &Path, services: &[&str]) {
    let mut content = String::from("# Homelab Stack\n\n## Services\n\n");
    for service in services {
        content.push_str(&format!(
            "- **{}**: available at https://{}.example.com\n",
            service, service
        ));
    }
    fs::write(dir.join("README.md"), content).unwrap();
}
