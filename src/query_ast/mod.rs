//! Federated query decomposition
//!
//! Splits one SELECT over tables that may live in different backends into a
//! sub-query per table (projections and single-table predicates pushed down)
//! plus the residual predicates and columns the coordinator must still handle.
//!
//! Pipeline: `scope` -> `attribution` -> `predicate` -> `synth`, driven by `decompose`.
//! Feature flag `query_ast` adds the SQL text front-end (`decompose_sql`).

pub mod ast;
pub mod attribution;
pub mod decompose;
pub mod emitter;
pub mod errors;
pub mod logical;
#[cfg(feature = "query_ast")]
pub mod parser;
pub mod predicate;
pub mod routing;
pub mod scope;
pub mod synth;

pub use decompose::decompose;
pub use errors::*;
pub use logical::*;
pub use routing::{Dispatch, route_plan};

#[cfg(feature = "query_ast")]
/// Parse raw SQL (a single plain SELECT) and decompose it.
pub fn decompose_sql(raw: &str) -> Result<DecompositionPlan, DecompositionError> {
    let query = parser::parse_select(raw)?;
    decompose(&query)
}
