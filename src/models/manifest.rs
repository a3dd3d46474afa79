use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Final key/value context handed to every resource file of a solution.
pub type Environment = BTreeMap<String, String>;

/// Well-known file at the root of a template repository.
pub const MANIFEST_FILE: &str = ".containerum.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub env: Environment,
    #[serde(default)]
    pub run: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Path of the resource file relative to the template repository.
    #[serde(rename = "config_file", alias = "name")]
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

/// Cluster object kinds a solution can own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Deployment,
    Service,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployment => "deployment",
            Self::Service => "service",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntryType {
    Resource(ResourceKind),
    Unknown(String),
}

impl From<String> for EntryType {
    fn from(raw: String) -> Self {
        match raw.trim() {
            "deployment" => Self::Resource(ResourceKind::Deployment),
            "service" => Self::Resource(ResourceKind::Service),
            _ => Self::Unknown(raw),
        }
    }
}

impl From<EntryType> for String {
    fn from(entry_type: EntryType) -> Self {
        entry_type.to_string()
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(kind) => kind.fmt(f),
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_original_manifest_layout() {
        let manifest: Manifest = serde_json::from_str(
            r#"{
                "env": {"PASSWORD": "secret"},
                "run": [
                    {"config_file": "d.json", "type": "deployment"},
                    {"name": "s.json", "type": "service"},
                    {"config_file": "i.json", "type": "ingress"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.env["PASSWORD"], "secret");
        assert_eq!(manifest.run.len(), 3);
        assert_eq!(manifest.run[0].name, "d.json");
        assert_eq!(
            manifest.run[0].entry_type,
            EntryType::Resource(ResourceKind::Deployment)
        );
        assert_eq!(manifest.run[1].name, "s.json");
        assert_eq!(
            manifest.run[1].entry_type,
            EntryType::Resource(ResourceKind::Service)
        );
        assert_eq!(manifest.run[2].entry_type, EntryType::Unknown("ingress".into()));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let manifest: Manifest = serde_json::from_str("{}").unwrap();
        assert!(manifest.env.is_empty());
        assert!(manifest.run.is_empty());
    }
}
