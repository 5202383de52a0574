//! Assigns each table plan to the backend that owns its table and renders the
//! sub-query in that backend's dialect.

use serde::Serialize;

use super::emitter::dialect::get_dialect;
use super::errors::RoutingError;
use super::logical::{DecompositionPlan, TablePlan};
use crate::models::enums::DatabaseType;
use crate::models::structs::Catalog;

/// A sub-query ready to be sent to one backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dispatch {
    pub alias: String,
    pub backend: String,
    pub db_type: DatabaseType,
    pub sql: String,
}

/// Route every table plan, in alias order.
pub fn route_plan(catalog: &Catalog, plan: &DecompositionPlan) -> Result<Vec<Dispatch>, RoutingError> {
    plan.table_plans.iter().map(|(alias, table_plan)| route_table(catalog, alias, table_plan)).collect()
}

fn route_table(catalog: &Catalog, alias: &str, plan: &TablePlan) -> Result<Dispatch, RoutingError> {
    let table = plan.source_table.unquoted();
    // Fully qualified name first, then the bare table name.
    let mut candidates = vec![table.clone()];
    candidates.extend(plan.source_table.base().map(|b| b.value.clone()));
    let backend_name = catalog
        .backend_for_table(&candidates)
        .ok_or_else(|| RoutingError::UnroutedTable { alias: alias.to_string(), table: table.clone() })?;

    let backend = catalog
        .backend(backend_name)
        .ok_or_else(|| RoutingError::UnknownBackend { table: table.clone(), backend: backend_name.to_string() })?;

    let dialect = get_dialect(&backend.backend);
    let sql = plan.render_for(dialect.as_ref());
    log::debug!("routed `{}` ({}) to backend `{}`: {}", alias, table, backend.name, sql);
    Ok(Dispatch { alias: alias.to_string(), backend: backend.name.clone(), db_type: backend.backend, sql })
}
