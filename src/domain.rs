use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

/// A host whose archived URLs are harvested. Stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Domain(String);

impl Domain {
    /// Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host pattern sent to the archive index: every subdomain, every path.
    pub fn wildcard_pattern(&self) -> String {
        format!("*.{}/*", self.0)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn parse_domain_list(content: &str) -> Vec<Domain> {
    content.lines().filter_map(Domain::parse).collect()
}

pub fn load_domains(path: &Path) -> Result<Vec<Domain>> {
    if !path.exists() {
        anyhow::bail!("Domain list not found: {:?}", path);
    }

    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let domains = parse_domain_list(&content);

    info!(action = "loaded", component = "domain_list", domain_count = domains.len(), file_path = ?path, "Loaded domains from file");
    Ok(domains)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_skipped_and_hosts_lowercased() {
        let domains = parse_domain_list("Example.COM\n\n   \n  b.org  \r\n");
        let names: Vec<&str> = domains.iter().map(Domain::as_str).collect();
        assert_eq!(names, vec!["example.com", "b.org"]);
    }

    #[test]
    fn wildcard_pattern_covers_subdomains() {
        let domain = Domain::parse("example.com").unwrap();
        assert_eq!(domain.wildcard_pattern(), "*.example.com/*");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_domains(&dir.path().join("nope.txt")).is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domains.txt");
        fs::write(&path, "a.com\nb.com\n").unwrap();
        assert_eq!(load_domains(&path).unwrap().len(), 2);
    }
}
