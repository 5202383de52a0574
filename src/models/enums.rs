use serde::{Deserialize, Serialize};

/// Backend family a table lives in; selects the dialect used for dispatch.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug, Default)]
pub enum DatabaseType {
    #[default]
    Generic,
    MySQL,
    PostgreSQL,
    SQLite,
    MsSQL,
}
