use serde::{Deserialize, Serialize};

use crate::models::enums::DatabaseType;

/// One backend that owns some of the federated tables. Credentials are resolved
/// by the execution layer and are not part of this description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub name: String,
    pub backend: DatabaseType,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub database: Option<String>,
}

/// Maps a (possibly schema-qualified) table name to the backend that stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRoute {
    pub table: String,
    pub backend: String,
}

/// Where each table lives.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
    #[serde(default)]
    pub tables: Vec<TableRoute>,
    #[serde(default)]
    pub default_backend: Option<String>,
}

impl Catalog {
    pub fn backend(&self, name: &str) -> Option<&BackendConfig> {
        self.backends.iter().find(|b| b.name == name)
    }

    /// Backend name for the first candidate spelling of a table that has a route,
    /// else the default backend. Table names compare ASCII case-insensitively.
    pub fn backend_for_table(&self, candidates: &[String]) -> Option<&str> {
        candidates
            .iter()
            .find_map(|name| self.tables.iter().find(|r| r.table.eq_ignore_ascii_case(name)))
            .map(|r| r.backend.as_str())
            .or(self.default_backend.as_deref())
    }
}
