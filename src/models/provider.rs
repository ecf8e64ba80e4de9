//! Resource provider metadata with expanded aliases

use serde::Deserialize;

/// `GET /subscriptions/{id}/providers/{namespace}` response
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceProvider {
    #[serde(rename = "namespace")]
    pub namespace: Option<String>,

    #[serde(rename = "resourceTypes")]
    pub resource_types: Vec<ResourceType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceType {
    #[serde(rename = "resourceType")]
    pub resource_type: Option<String>,

    #[serde(rename = "aliases", default)]
    pub aliases: Vec<Alias>,
}

/// A policy alias; the API also returns `paths` and `type`, which are ignored
#[derive(Debug, Clone, Deserialize)]
pub struct Alias {
    #[serde(rename = "name")]
    pub name: String,

    #[serde(rename = "defaultPath")]
    pub default_path: String,
}

/// One line of the export file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRow {
    pub name: String,
    pub default_path: String,
}

impl ResourceProvider {
    /// Flatten `resourceTypes[].aliases[]`, keeping resource type order then alias order
    pub fn alias_rows(&self) -> Vec<AliasRow> {
        self.resource_types
            .iter()
            .flat_map(|rt| rt.aliases.iter())
            .map(|alias| AliasRow {
                name: alias.name.clone(),
                default_path: alias.default_path.clone(),
            })
            .collect()
    }

    pub fn alias_count(&self) -> usize {
        self.resource_types.iter().map(|rt| rt.aliases.len()).sum()
    }
}
