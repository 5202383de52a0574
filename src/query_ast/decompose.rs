//! Decomposition driver: scope -> attribution -> classification -> synthesis.

use super::ast::SelectQuery;
use super::attribution::Attributor;
use super::errors::DecompositionError;
use super::logical::DecompositionPlan;
use super::predicate;
use super::scope::Scope;
use super::synth;

/// Decompose one parsed query into per-table plans and the coordinator residual.
///
/// Pure and synchronous; the first structural error aborts the call.
pub fn decompose(query: &SelectQuery) -> Result<DecompositionPlan, DecompositionError> {
    let scope = Scope::build(query)?;
    let attributor = Attributor::new(&scope, query);
    let attribution = attributor.attribute(query)?;
    let classification = predicate::classify(query, &attributor)?;
    let table_plans = synth::synthesize(&scope, &attribution, &classification.pushed);

    let plan = DecompositionPlan {
        table_plans,
        residual_projections: attribution.ambiguous.clone(),
        residual_predicates: classification.residual,
        ambiguous_columns: attribution.ambiguous,
    };
    log::debug!(
        "decomposed into {} table plan(s), {} residual predicate(s), {} ambiguous column(s)",
        plan.table_plans.len(),
        plan.residual_predicates.len(),
        plan.ambiguous_columns.len()
    );
    Ok(plan)
}
