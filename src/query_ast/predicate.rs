//! Predicate extraction, conjunction flattening and pushdown classification.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::ast::{BinaryOperator, Expr, JoinConstraint, JoinKind, SelectQuery};
use super::attribution::{Attributor, Clause, ColumnOwner};
use super::errors::DecompositionError;
use super::logical::{PredicateAtom, PredicateSource, ReferencedTable};

/// Split a top-level AND chain into its operands, left to right.
///
/// Parenthesized AND chains are looked through; every other node, OR included,
/// is returned whole.
pub fn flatten_conjunction(expr: &Expr) -> Vec<&Expr> {
    fn rec<'a>(e: &'a Expr, out: &mut Vec<&'a Expr>) {
        match e {
            Expr::BinaryOp { left, op: BinaryOperator::And, right } => {
                rec(left, out);
                rec(right, out);
            }
            Expr::Nested(_) => match strip_parens(e) {
                inner @ Expr::BinaryOp { op: BinaryOperator::And, .. } => rec(inner, out),
                _ => out.push(e),
            },
            other => out.push(other),
        }
    }
    let mut out = Vec::new();
    rec(expr, &mut out);
    out
}

fn strip_parens(mut expr: &Expr) -> &Expr {
    while let Expr::Nested(inner) = expr {
        expr = inner;
    }
    expr
}

/// Predicate sources in classification order: WHERE, HAVING, then each JOIN ... ON.
pub fn predicate_sources(query: &SelectQuery) -> Vec<(PredicateSource, &Expr)> {
    let mut sources = Vec::new();
    if let Some(selection) = &query.selection {
        sources.push((PredicateSource::Where, selection));
    }
    if let Some(having) = &query.having {
        sources.push((PredicateSource::Having, having));
    }
    for (i, join) in query.joins().enumerate() {
        if let JoinConstraint::On(on) = &join.constraint {
            sources.push((PredicateSource::JoinOn(i), on));
        }
    }
    sources
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateClassification {
    /// alias -> atoms in flattening order
    pub pushed: BTreeMap<String, Vec<PredicateAtom>>,
    pub residual: Vec<PredicateAtom>,
}

/// Which tables sit on the optional side of an outer join.
struct OuterJoinShape {
    kinds: Vec<JoinKind>,
    /// Null-supplying aliases per join, in join order.
    per_join: Vec<HashSet<String>>,
    /// Number of outer joins each alias is null-supplying in.
    counts: HashMap<String, usize>,
}

impl OuterJoinShape {
    fn from_query(query: &SelectQuery, attributor: &Attributor<'_>) -> Self {
        let aliases: Vec<String> = attributor.scope().entries().iter().map(|e| e.alias.to_string()).collect();
        let mut next = aliases.iter();
        let mut shape = OuterJoinShape { kinds: Vec::new(), per_join: Vec::new(), counts: HashMap::new() };

        for item in &query.from {
            let mut left: HashSet<String> = next.next().cloned().into_iter().collect();
            for join in &item.joins {
                let right = next.next().cloned().unwrap_or_default();
                let nullable: HashSet<String> = match join.kind {
                    JoinKind::Inner | JoinKind::Cross => HashSet::new(),
                    JoinKind::Left => HashSet::from([right.clone()]),
                    JoinKind::Right => left.clone(),
                    JoinKind::Full => left.iter().cloned().chain([right.clone()]).collect(),
                };
                for alias in &nullable {
                    *shape.counts.entry(alias.clone()).or_default() += 1;
                }
                shape.kinds.push(join.kind);
                shape.per_join.push(nullable);
                left.insert(right);
            }
        }
        shape
    }

    fn nullable_count(&self, alias: &str) -> usize {
        self.counts.get(alias).copied().unwrap_or(0)
    }

    /// Whether a single-table atom from `source` may be evaluated at `alias`'s backend.
    fn allows_push(&self, source: PredicateSource, alias: &str) -> bool {
        match source {
            PredicateSource::Where | PredicateSource::Having => self.nullable_count(alias) == 0,
            PredicateSource::JoinOn(j) => match self.kinds.get(j) {
                Some(JoinKind::Inner | JoinKind::Cross) => self.nullable_count(alias) == 0,
                Some(JoinKind::Left | JoinKind::Right) => {
                    self.per_join[j].contains(alias) && self.nullable_count(alias) == 1
                }
                Some(JoinKind::Full) | None => false,
            },
        }
    }
}

fn clause_of(source: PredicateSource) -> Clause {
    match source {
        PredicateSource::Where => Clause::Where,
        PredicateSource::Having => Clause::Having,
        PredicateSource::JoinOn(_) => Clause::JoinOn,
    }
}

/// Tables referenced by an atom, with `Unresolved` for any column that is not owned by one alias.
pub fn referenced_tables(expr: &Expr, source: PredicateSource, attributor: &Attributor<'_>) -> BTreeSet<ReferencedTable> {
    expr.columns()
        .into_iter()
        .map(|col| match attributor.resolve(col, clause_of(source)) {
            ColumnOwner::Owned(alias) => ReferencedTable::Alias(alias),
            _ => ReferencedTable::Unresolved,
        })
        .collect()
}

pub fn classify(query: &SelectQuery, attributor: &Attributor<'_>) -> Result<PredicateClassification, DecompositionError> {
    let shape = OuterJoinShape::from_query(query, attributor);
    let mut out = PredicateClassification::default();

    for (source, root) in predicate_sources(query) {
        if let Some(text) = root.find_unsupported() {
            return Err(DecompositionError::unsupported(text.to_string()));
        }
        for conjunct in flatten_conjunction(root) {
            let atom = PredicateAtom {
                expr: conjunct.clone(),
                source,
                referenced_tables: referenced_tables(conjunct, source, attributor),
            };
            let target = atom
                .single_table()
                .filter(|alias| !conjunct.contains_aggregate() && shape.allows_push(source, alias))
                .map(str::to_string);
            match target {
                Some(alias) => {
                    log::debug!("atom `{}` ({:?}) pushed to `{}`", atom.sql(), source, alias);
                    out.pushed.entry(alias).or_default().push(atom);
                }
                None => {
                    log::debug!("atom `{}` ({:?}) kept residual, refs={:?}", atom.sql(), source, atom.referenced_tables);
                    out.residual.push(atom);
                }
            }
        }
    }
    Ok(out)
}
