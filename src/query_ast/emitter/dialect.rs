//! Backend dialects for rendering synthesized sub-queries
//!
//! The generic dialect reproduces identifiers exactly as they were written;
//! backend dialects re-quote quoted identifiers and adjust literals so a
//! table plan can be dispatched to the backend that owns the table.

use super::super::ast::Ident;
use crate::models::enums::DatabaseType;

/// Backend-specific rendering of identifiers and literals in a dispatched sub-query.
pub trait SqlDialect: Send + Sync {
    /// Backend family this dialect renders for
    fn db_type(&self) -> DatabaseType;

    /// Wrap a name in the backend's identifier quotes
    fn quote_ident(&self, ident: &str) -> String;

    /// Render an identifier, quoting only those that were quoted in the source
    fn render_ident(&self, ident: &Ident) -> String {
        match ident.quote_style {
            Some(_) => self.quote_ident(&ident.value),
            None => ident.value.clone(),
        }
    }

    /// Single-quoted string literal with embedded quotes doubled
    fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    /// Backends without a boolean type override this
    fn emit_boolean(&self, value: bool) -> String {
        if value { "TRUE" } else { "FALSE" }.to_string()
    }

    fn emit_null(&self) -> String {
        "NULL".to_string()
    }

    /// String concatenation of two rendered operands
    fn emit_concat(&self, left: &str, right: &str) -> String {
        format!("{} || {}", left, right)
    }

    /// Case-insensitive match; backends without ILIKE compare lowered operands
    fn emit_ilike(&self, expr: &str, pattern: &str, negated: bool) -> String {
        if matches!(self.db_type(), DatabaseType::PostgreSQL | DatabaseType::Generic) {
            if negated {
                format!("{} NOT ILIKE {}", expr, pattern)
            } else {
                format!("{} ILIKE {}", expr, pattern)
            }
        } else {
            let op = if negated { "NOT LIKE" } else { "LIKE" };
            format!("LOWER({}) {} LOWER({})", expr, op, pattern)
        }
    }
}

/// Dialect-neutral rendering used for extraction and for `TablePlan::synthesized_sql`
pub struct GenericDialect;

impl SqlDialect for GenericDialect {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::Generic
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn render_ident(&self, ident: &Ident) -> String {
        match ident.quote_style {
            Some('[') => format!("[{}]", ident.value.replace(']', "]]")),
            Some(q) => {
                let doubled = format!("{q}{q}");
                format!("{q}{}{q}", ident.value.replace(q, &doubled))
            }
            None => ident.value.clone(),
        }
    }
}

/// Backtick identifiers; backslashes in strings are escapes.
pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::MySQL
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
    }

    // `||` is logical OR under the default sql_mode.
    fn emit_concat(&self, left: &str, right: &str) -> String {
        format!("CONCAT({}, {})", left, right)
    }
}

pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::PostgreSQL
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }
}

/// Booleans are stored as integers.
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn emit_boolean(&self, value: bool) -> String {
        if value { "1" } else { "0" }.to_string()
    }
}

/// Bracketed identifiers, BIT booleans.
pub struct MssqlDialect;

impl SqlDialect for MssqlDialect {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::MsSQL
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("[{}]", ident.replace(']', "]]"))
    }

    fn emit_boolean(&self, value: bool) -> String {
        if value { "1" } else { "0" }.to_string()
    }

    fn emit_concat(&self, left: &str, right: &str) -> String {
        format!("CONCAT({}, {})", left, right)
    }
}

/// Dialect used to render sub-queries dispatched to `db_type`.
pub fn get_dialect(db_type: &DatabaseType) -> Box<dyn SqlDialect> {
    match db_type {
        DatabaseType::Generic => Box::new(GenericDialect),
        DatabaseType::MySQL => Box::new(MySqlDialect),
        DatabaseType::PostgreSQL => Box::new(PostgresDialect),
        DatabaseType::SQLite => Box::new(SqliteDialect),
        DatabaseType::MsSQL => Box::new(MssqlDialect),
    }
}
