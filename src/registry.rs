use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Node type used when no mapping matches a module type.
pub const FALLBACK_NODE_TYPE: &str = "n8n-nodes-base.function";

fn default_fallback() -> String {
    FALLBACK_NODE_TYPE.to_string()
}

/// Table of module-type to node-type pairs plus the generic fallback type.
///
/// Keys are stored lower-cased; lookups are case-insensitive. The built-in
/// defaults cover the common Make.com modules and can be extended from a
/// mappings file (JSON by default, TOML behind the `toml` feature).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeTypeTable {
    #[serde(default)]
    pub mappings: IndexMap<String, String>,
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

impl Default for NodeTypeTable {
    fn default() -> Self {
        let mut mappings = IndexMap::new();
        for (module, node) in [
            ("http", "n8n-nodes-base.httpRequest"),
            ("email", "n8n-nodes-base.emailSend"),
            ("webhook", "n8n-nodes-base.webhook"),
            ("googlesheets", "n8n-nodes-base.googleSheets"),
            ("gmail", "n8n-nodes-base.gmail"),
            ("filter", "n8n-nodes-base.if"),
            ("router", "n8n-nodes-base.switch"),
            ("airtable", "n8n-nodes-base.airtable"),
            ("slack", "n8n-nodes-base.slack"),
            ("text-parser", "n8n-nodes-base.splitInBatches"),
            ("iterator", "n8n-nodes-base.splitInBatches"),
        ] {
            mappings.insert(module.to_string(), node.to_string());
        }
        NodeTypeTable {
            mappings,
            fallback: default_fallback(),
        }
    }
}

impl NodeTypeTable {
    /// Table with no entries, only the fallback.
    pub fn empty() -> Self {
        NodeTypeTable {
            mappings: IndexMap::new(),
            fallback: default_fallback(),
        }
    }

    pub fn with_mapping(
        mut self,
        module_type: impl AsRef<str>,
        node_type: impl Into<String>,
    ) -> Self {
        self.mappings
            .insert(module_type.as_ref().to_lowercase(), node_type.into());
        self
    }

    /// Case-insensitive lookup.
    pub fn get(&self, module_type: &str) -> Option<&str> {
        self.mappings
            .get(&module_type.to_lowercase())
            .map(String::as_str)
    }

    /// Merge another table into this one. Its entries win on collision and
    /// its fallback replaces the current one.
    pub fn extend_with(&mut self, other: NodeTypeTable) {
        for (module_type, node_type) in other.mappings {
            self.mappings.insert(module_type.to_lowercase(), node_type);
        }
        self.fallback = other.fallback;
    }

    fn normalized(mut self) -> Self {
        self.mappings = std::mem::take(&mut self.mappings)
            .into_iter()
            .map(|(module_type, node_type)| (module_type.to_lowercase(), node_type))
            .collect();
        self
    }

    /// Load a mappings file, accepting JSON by default and TOML when the `toml` feature is enabled.
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let txt = fs::read_to_string(path_ref)
            .with_context(|| format!("unable to read mappings file at {}", path_ref.display()))?;
        if let Ok(value) = serde_json::from_str::<Self>(&txt) {
            return Ok(value.normalized());
        }

        #[cfg(feature = "toml")]
        {
            if let Ok(value) = toml::from_str::<Self>(&txt) {
                return Ok(value.normalized());
            }
        }

        #[cfg(feature = "toml")]
        {
            anyhow::bail!(
                "unsupported mappings format in {}: expected JSON or TOML",
                path_ref.display()
            );
        }

        #[cfg(not(feature = "toml"))]
        {
            anyhow::bail!(
                "unsupported mappings format in {}: expected JSON (enable `toml` feature for TOML support)",
                path_ref.display()
            );
        }
    }
}
