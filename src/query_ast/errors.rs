#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecompositionError {
    #[error("parse/scope error: {0}")] ParseOrScope(String),
    #[error("duplicate table alias `{0}`")] DuplicateAlias(String),
    #[error("table `{0}` needs an alias in a multi-table query")] MissingAlias(String),
    #[error("unsupported construct: {0}")] UnsupportedConstruct(String),
}

impl DecompositionError {
    pub(crate) fn unsupported(what: impl Into<String>) -> Self { DecompositionError::UnsupportedConstruct(what.into()) }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("no backend route for table `{table}` (alias `{alias}`) and no default backend")] UnroutedTable { alias: String, table: String },
    #[error("route for `{table}` names unknown backend `{backend}`")] UnknownBackend { table: String, backend: String },
}
