//! Decomposition output: per-table plans plus the residual left for the coordinator.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Serialize, Serializer};

use super::ast::{ColumnRef, Expr, Ident, ObjectName};
use super::emitter::{self, dialect::SqlDialect};

/// A table an atom depends on. `Unresolved` marks a reference that could not
/// be pinned to one scope entry and makes the atom non-pushable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReferencedTable {
    Alias(String),
    Unresolved,
}

impl ReferencedTable {
    /// JSON spelling of `Unresolved`; angle brackets keep it apart from unquoted aliases.
    pub const UNRESOLVED_MARKER: &'static str = "<unresolved>";
}

impl Serialize for ReferencedTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ReferencedTable::Alias(alias) => serializer.serialize_str(alias),
            ReferencedTable::Unresolved => serializer.serialize_str(Self::UNRESOLVED_MARKER),
        }
    }
}

/// Clause a predicate atom was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateSource {
    Where,
    Having,
    /// ON clause of the n-th join (0-based, source order).
    JoinOn(usize),
}

/// One operand of a flattened top-level AND chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredicateAtom {
    #[serde(rename = "sql", serialize_with = "serialize_as_sql")]
    pub expr: Expr,
    pub source: PredicateSource,
    pub referenced_tables: BTreeSet<ReferencedTable>,
}

impl PredicateAtom {
    /// Dialect-neutral text of the atom.
    pub fn sql(&self) -> String {
        self.expr.to_string()
    }

    /// The alias this atom can be pushed to, if it references exactly one resolved table.
    pub fn single_table(&self) -> Option<&str> {
        let mut iter = self.referenced_tables.iter();
        match (iter.next(), iter.next()) {
            (Some(ReferencedTable::Alias(alias)), None) => Some(alias),
            _ => None,
        }
    }
}

fn serialize_as_sql<S: Serializer>(expr: &Expr, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(expr)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePlan {
    pub alias: Ident,
    pub source_table: ObjectName,
    pub explicit_alias: bool,
    /// Sorted alphabetically, deduplicated.
    pub projected_columns: Vec<Ident>,
    /// Select list renders as `*` (explicit wildcard or nothing projected).
    pub wildcard: bool,
    pub pushed_predicates: Vec<PredicateAtom>,
    pub synthesized_sql: String,
}

impl TablePlan {
    pub fn needs_alias_clause(&self) -> bool {
        self.explicit_alias || self.source_table.base().is_none_or(|base| *base != self.alias)
    }

    /// Re-render this plan for a specific backend.
    pub fn render_for(&self, dialect: &dyn SqlDialect) -> String {
        emitter::emit_table_plan(self, dialect)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DecompositionPlan {
    /// Keyed by alias as written in the query.
    pub table_plans: BTreeMap<String, TablePlan>,
    pub residual_projections: Vec<ColumnRef>,
    pub residual_predicates: Vec<PredicateAtom>,
    pub ambiguous_columns: Vec<ColumnRef>,
}

impl DecompositionPlan {
    pub fn table_plan(&self, alias: &str) -> Option<&TablePlan> {
        self.table_plans.get(alias)
    }

    /// Residual predicates recombined with AND, for the coordinator query.
    pub fn residual_predicate(&self) -> Option<Expr> {
        let atoms: Vec<&Expr> = self.residual_predicates.iter().map(|a| &a.expr).collect();
        emitter::conjoin(&atoms)
    }
}
