//! Distribution catalog.
//!
//! Fixed mapping from a human-readable label to an image reference. Loaded
//! once at startup; used to build the selection keyboard and to validate the
//! label that comes back from it.

use serde::{Deserialize, Serialize};
use shellix_shared::errors::{ShellixError, ShellixResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    /// Label shown to the user, e.g. "Ubuntu".
    pub label: String,
    /// Image reference passed to the engine, e.g. "ubuntu:24.04".
    pub image: String,
}

impl Distribution {
    pub fn new(label: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            image: image.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DistributionCatalog {
    entries: Vec<Distribution>,
}

impl DistributionCatalog {
    /// Build a catalog, rejecting empty lists and duplicate labels.
    pub fn new(entries: Vec<Distribution>) -> ShellixResult<Self> {
        if entries.is_empty() {
            return Err(ShellixError::Config(
                "distribution catalog must not be empty".into(),
            ));
        }
        for (i, entry) in entries.iter().enumerate() {
            if entry.label.trim().is_empty() || entry.image.trim().is_empty() {
                return Err(ShellixError::Config(format!(
                    "distribution #{} needs both a label and an image",
                    i + 1
                )));
            }
            if entries[..i]
                .iter()
                .any(|other| other.label.eq_ignore_ascii_case(&entry.label))
            {
                return Err(ShellixError::Config(format!(
                    "duplicate distribution label: {}",
                    entry.label
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Find a distribution by label, ignoring ASCII case.
    pub fn resolve(&self, label: &str) -> Option<&Distribution> {
        let label = label.trim();
        self.entries
            .iter()
            .find(|d| d.label.eq_ignore_ascii_case(label))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|d| d.label.as_str())
    }

    pub fn entries(&self) -> &[Distribution] {
        &self.entries
    }
}

impl Default for DistributionCatalog {
    fn default() -> Self {
        Self {
            entries: default_distributions(),
        }
    }
}

pub fn default_distributions() -> Vec<Distribution> {
    vec![
        Distribution::new("Ubuntu", "ubuntu:24.04"),
        Distribution::new("Debian", "debian:bookworm"),
        Distribution::new("Alpine", "alpine:latest"),
        Distribution::new("Fedora", "fedora:latest"),
        Distribution::new("Arch Linux", "archlinux:latest"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_ignores_case_and_whitespace() {
        let catalog = DistributionCatalog::default();
        assert_eq!(catalog.resolve(" alpine ").unwrap().image, "alpine:latest");
        assert_eq!(catalog.resolve("ARCH LINUX").unwrap().label, "Arch Linux");
        assert!(catalog.resolve("Gentoo").is_none());
    }

    #[test]
    fn labels_keep_declaration_order() {
        let catalog = DistributionCatalog::default();
        let labels: Vec<_> = catalog.labels().collect();
        assert_eq!(labels.first(), Some(&"Ubuntu"));
        assert_eq!(labels.len(), 5);
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let err = DistributionCatalog::new(vec![]).unwrap_err();
        assert!(matches!(err, ShellixError::Config(_)));
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let err = DistributionCatalog::new(vec![
            Distribution::new("Alpine", "alpine:3.20"),
            Distribution::new("alpine", "alpine:latest"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}
