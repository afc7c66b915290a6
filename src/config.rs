use crate::provenance::{SoftwareAgent, DEFAULT_HOMEPAGE};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given
pub const CONFIG_FILENAME: &str = "kwyk2nidm.toml";

/// kwyk2nidm configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Kwyk2NidmConfig {
    /// Configuration file version
    pub version: String,

    /// CDE registry and ontology mapping
    pub registry: RegistryConfig,

    /// Output files
    pub output: OutputConfig,

    /// Software agent recorded in provenance
    pub agent: AgentConfig,
}

impl Default for Kwyk2NidmConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            registry: RegistryConfig::default(),
            output: OutputConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Persisted CDE registry
    pub cde_file: PathBuf,

    /// Ontology mapping file
    pub map_file: PathBuf,

    /// Fail on keys missing from the registry
    pub strict: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            cde_file: PathBuf::from("mapping_data/kwyk-cdes.json"),
            map_file: PathBuf::from("mapping_data/kwykmap.json"),
            strict: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where `--gen-nidm` writes the CDE graph
    pub cde_graph_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            cde_graph_file: PathBuf::from("KWYK-NIDM.ttl"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub homepage: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            homepage: DEFAULT_HOMEPAGE.to_string(),
        }
    }
}

impl AgentConfig {
    pub fn software_agent(&self) -> SoftwareAgent {
        SoftwareAgent {
            homepage: self.homepage.clone(),
            ..SoftwareAgent::default()
        }
    }
}

impl Kwyk2NidmConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }

    /// Load an explicit config file, or `kwyk2nidm.toml` from `dir` if present.
    /// Falls back to defaults when neither exists.
    pub fn load_or_default(explicit: Option<&Path>, dir: &Path) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let path = dir.join(CONFIG_FILENAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }
}
