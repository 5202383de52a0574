//! Sub-query synthesis: one `TablePlan` per scope entry.

use std::collections::BTreeMap;

use super::attribution::ColumnAttribution;
use super::emitter::{self, dialect::GenericDialect};
use super::logical::{PredicateAtom, TablePlan};
use super::scope::Scope;

/// Build table plans from the scope and the attribution/classification outputs.
/// No catalog validation happens here.
pub fn synthesize(
    scope: &Scope,
    attribution: &ColumnAttribution,
    pushed: &BTreeMap<String, Vec<PredicateAtom>>,
) -> BTreeMap<String, TablePlan> {
    let mut plans = BTreeMap::new();
    for entry in scope.entries() {
        let key = entry.alias.to_string();
        let mut plan = TablePlan {
            alias: entry.alias.clone(),
            source_table: entry.table.name.clone(),
            explicit_alias: entry.explicit_alias,
            projected_columns: attribution.projected_columns(&key),
            wildcard: attribution.wildcard.contains(&key),
            pushed_predicates: pushed.get(&key).cloned().unwrap_or_default(),
            synthesized_sql: String::new(),
        };
        if plan.projected_columns.is_empty() {
            plan.wildcard = true;
        }
        plan.synthesized_sql = emitter::emit_table_plan(&plan, &GenericDialect);
        log::debug!("table plan `{}`: {}", key, plan.synthesized_sql);
        plans.insert(key, plan);
    }
    plans
}
