//! Column attribution: decides which scope entry owns each column reference.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::ast::{ColumnRef, Expr, Ident, JoinConstraint, SelectItem, SelectQuery};
use super::errors::DecompositionError;
use super::scope::Scope;

/// Query clause a column reference was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    Projection,
    JoinOn,
    Where,
    GroupBy,
    Having,
    OrderBy,
}

impl Clause {
    /// Clauses evaluated after the select list, where output aliases are visible.
    fn sees_output_aliases(self) -> bool {
        matches!(self, Clause::GroupBy | Clause::Having | Clause::OrderBy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnOwner {
    /// Attributed to the alias (rendered text) of a single scope entry.
    Owned(String),
    /// Unqualified name with several tables in scope.
    Ambiguous,
    /// Qualifier present but naming nothing in scope.
    UnknownQualifier(String),
    /// Bare name referring to a select-list alias rather than a table column.
    ProjectionAlias,
}

/// Resolves column references against a scope.
pub struct Attributor<'a> {
    scope: &'a Scope,
    output_aliases: HashSet<String>,
}

impl<'a> Attributor<'a> {
    pub fn new(scope: &'a Scope, query: &SelectQuery) -> Self {
        let output_aliases = query
            .projection
            .iter()
            .filter_map(|item| match item {
                SelectItem::Expr { alias: Some(a), .. } => Some(a.match_key()),
                _ => None,
            })
            .collect();
        Self { scope, output_aliases }
    }

    pub fn scope(&self) -> &Scope {
        self.scope
    }

    pub fn resolve(&self, col: &ColumnRef, clause: Clause) -> ColumnOwner {
        match &col.qualifier {
            Some(q) => match self.scope.resolve_qualifier(q) {
                Some(entry) => ColumnOwner::Owned(entry.alias.to_string()),
                None => ColumnOwner::UnknownQualifier(q.to_string()),
            },
            None if clause.sees_output_aliases() && self.output_aliases.contains(&col.name.match_key()) => {
                ColumnOwner::ProjectionAlias
            }
            None => match self.scope.sole_entry() {
                Some(entry) => ColumnOwner::Owned(entry.alias.to_string()),
                None => ColumnOwner::Ambiguous,
            },
        }
    }

    /// Attribute every column reference in the query.
    pub fn attribute(&self, query: &SelectQuery) -> Result<ColumnAttribution, DecompositionError> {
        let mut out = ColumnAttribution::default();
        let mut seen_ambiguous = HashSet::new();

        for item in &query.projection {
            match item {
                SelectItem::Expr { expr, .. } => self.attribute_expr(expr, Clause::Projection, &mut out, &mut seen_ambiguous)?,
                SelectItem::Wildcard => {
                    out.wildcard.extend(self.scope.entries().iter().map(|e| e.alias.to_string()));
                }
                SelectItem::QualifiedWildcard(name) => match self.scope.resolve_qualifier(name) {
                    Some(entry) => {
                        out.wildcard.insert(entry.alias.to_string());
                    }
                    None => {
                        return Err(DecompositionError::ParseOrScope(format!(
                            "wildcard qualifier `{}` does not name a table in scope",
                            name
                        )));
                    }
                },
            }
        }
        for join in query.joins() {
            if let JoinConstraint::On(on) = &join.constraint {
                self.attribute_expr(on, Clause::JoinOn, &mut out, &mut seen_ambiguous)?;
            }
        }
        if let Some(selection) = &query.selection {
            self.attribute_expr(selection, Clause::Where, &mut out, &mut seen_ambiguous)?;
        }
        for g in &query.group_by {
            self.attribute_expr(g, Clause::GroupBy, &mut out, &mut seen_ambiguous)?;
        }
        if let Some(having) = &query.having {
            self.attribute_expr(having, Clause::Having, &mut out, &mut seen_ambiguous)?;
        }
        for item in &query.order_by {
            self.attribute_expr(&item.expr, Clause::OrderBy, &mut out, &mut seen_ambiguous)?;
        }

        log::debug!(
            "attributed columns to {} table(s), {} ambiguous",
            out.projected.len(),
            out.ambiguous.len()
        );
        Ok(out)
    }

    fn attribute_expr(
        &self,
        expr: &Expr,
        clause: Clause,
        out: &mut ColumnAttribution,
        seen_ambiguous: &mut HashSet<String>,
    ) -> Result<(), DecompositionError> {
        if let Some(text) = expr.find_unsupported() {
            return Err(DecompositionError::unsupported(text.to_string()));
        }
        for col in expr.columns() {
            match self.resolve(col, clause) {
                ColumnOwner::Owned(alias) => {
                    out.projected
                        .entry(alias)
                        .or_default()
                        .entry(col.name.match_key())
                        .or_insert_with(|| col.name.clone());
                }
                ColumnOwner::Ambiguous | ColumnOwner::UnknownQualifier(_) => {
                    if seen_ambiguous.insert(col.to_string()) {
                        out.ambiguous.push(col.clone());
                    }
                }
                ColumnOwner::ProjectionAlias => {}
            }
        }
        Ok(())
    }
}

/// Result of column attribution, keyed by rendered alias text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnAttribution {
    /// alias -> column match key -> first spelling encountered
    pub projected: BTreeMap<String, BTreeMap<String, Ident>>,
    /// Aliases whose select list must stay `*`.
    pub wildcard: BTreeSet<String>,
    /// Columns not attributable to exactly one table, deduplicated by text.
    pub ambiguous: Vec<ColumnRef>,
}

impl ColumnAttribution {
    /// Projected columns of one alias in alphabetical order.
    pub fn projected_columns(&self, alias: &str) -> Vec<Ident> {
        self.projected.get(alias).map(|cols| cols.values().cloned().collect()).unwrap_or_default()
    }
}
