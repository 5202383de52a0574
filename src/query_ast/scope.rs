//! Alias resolution for the relations named in FROM/JOIN position.

use std::collections::HashMap;

use super::ast::{Ident, JoinConstraint, ObjectName, SelectQuery, TableFactor, TableRef};
use super::errors::DecompositionError;

#[derive(Debug, Clone, PartialEq)]
pub struct ScopeEntry {
    pub alias: Ident,
    pub table: TableRef,
    /// False when the alias was derived from the table's own name.
    pub explicit_alias: bool,
}

/// Alias -> table mapping for one query. Entries keep FROM/JOIN source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scope {
    entries: Vec<ScopeEntry>,
    by_key: HashMap<String, usize>,
}

impl Scope {
    pub fn build(query: &SelectQuery) -> Result<Scope, DecompositionError> {
        for join in query.joins() {
            match &join.constraint {
                JoinConstraint::Using(_) => return Err(DecompositionError::unsupported("JOIN ... USING")),
                JoinConstraint::Natural => return Err(DecompositionError::unsupported("NATURAL JOIN")),
                JoinConstraint::On(_) | JoinConstraint::None => {}
            }
        }

        let relations = query.relations();
        if relations.is_empty() {
            return Err(DecompositionError::ParseOrScope("query has no table references".into()));
        }
        let multi = relations.len() > 1;

        let mut scope = Scope::default();
        for relation in relations {
            let table = match relation {
                TableFactor::Table(t) => t,
                TableFactor::Derived { .. } => return Err(DecompositionError::unsupported("subquery as a table source")),
                TableFactor::Unsupported(text) => return Err(DecompositionError::unsupported(text.clone())),
            };
            let Some(base) = table.name.base().filter(|b| !b.value.is_empty()) else {
                return Err(DecompositionError::ParseOrScope("table reference with an empty name".into()));
            };
            let (alias, explicit_alias) = match table.alias.as_ref().filter(|a| !a.value.is_empty()) {
                Some(a) => (a.clone(), true),
                None if multi => return Err(DecompositionError::MissingAlias(table.name.to_string())),
                None => (base.clone(), false),
            };
            scope.insert(ScopeEntry { alias, table: table.clone(), explicit_alias })?;
        }
        log::debug!(
            "scope built: {}",
            scope.entries.iter().map(|e| format!("{} -> {}", e.alias, e.table.name)).collect::<Vec<_>>().join(", ")
        );
        Ok(scope)
    }

    fn insert(&mut self, entry: ScopeEntry) -> Result<(), DecompositionError> {
        let key = entry.alias.match_key();
        if self.by_key.contains_key(&key) {
            return Err(DecompositionError::DuplicateAlias(entry.alias.value.clone()));
        }
        self.by_key.insert(key, self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[ScopeEntry] {
        &self.entries
    }

    pub fn lookup(&self, alias: &Ident) -> Option<&ScopeEntry> {
        self.by_key.get(&alias.match_key()).map(|&i| &self.entries[i])
    }

    /// The only entry of a single-table scope.
    pub fn sole_entry(&self) -> Option<&ScopeEntry> {
        match self.entries.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Resolve a column qualifier: a single part names an alias, several parts
    /// must spell the full source name of an entry that has no explicit alias.
    pub fn resolve_qualifier(&self, qualifier: &ObjectName) -> Option<&ScopeEntry> {
        match qualifier.0.as_slice() {
            [single] => self.lookup(single),
            _ => {
                let key = qualifier.match_key();
                self.entries.iter().find(|e| !e.explicit_alias && e.table.name.match_key() == key)
            }
        }
    }
}
