//! Expression tree consumed by the decomposition engine.
//!
//! The tree is produced by a parser front-end (see `parser.rs`) or built by hand,
//! and is never mutated by the engine. Nodes own their children exclusively.

use std::fmt;

use serde::{Serialize, Serializer};

use super::emitter::ExprEmitter;
use super::emitter::dialect::{GenericDialect, SqlDialect};

/// A single identifier together with the quote character it was written with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub value: String,
    pub quote_style: Option<char>,
}

impl Ident {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into(), quote_style: None }
    }

    pub fn quoted(value: impl Into<String>, quote: char) -> Self {
        Self { value: value.into(), quote_style: Some(quote) }
    }

    /// Key used for alias comparison: unquoted identifiers fold case, quoted ones are exact.
    pub fn match_key(&self) -> String {
        match self.quote_style {
            Some(_) => self.value.clone(),
            None => self.value.to_ascii_lowercase(),
        }
    }
}

/// Dotted name such as `schema.table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectName(pub Vec<Ident>);

impl ObjectName {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Ident::new).collect())
    }

    /// Last component, i.e. the bare table name.
    pub fn base(&self) -> Option<&Ident> {
        self.0.last()
    }

    pub fn match_key(&self) -> String {
        self.0.iter().map(Ident::match_key).collect::<Vec<_>>().join(".")
    }

    /// Dotted name without quote characters, as catalogs spell it.
    pub fn unquoted(&self) -> String {
        self.0.iter().map(|part| part.value.as_str()).collect::<Vec<_>>().join(".")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub name: ObjectName,
    pub alias: Option<Ident>,
}

impl TableRef {
    pub fn new(name: ObjectName, alias: Option<&str>) -> Self {
        Self { name, alias: alias.map(Ident::new) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub qualifier: Option<ObjectName>,
    pub name: Ident,
}

impl ColumnRef {
    pub fn bare(name: &str) -> Self {
        Self { qualifier: None, name: Ident::new(name) }
    }

    pub fn qualified(qualifier: &str, name: &str) -> Self {
        Self { qualifier: Some(ObjectName::new([qualifier])), name: Ident::new(name) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(String),
    String(String),
    Boolean(bool),
    Null,
}

pub const PREC_OR: u8 = 5;
pub const PREC_AND: u8 = 10;
pub const PREC_NOT: u8 = 15;
pub const PREC_IS: u8 = 17;
pub const PREC_LIKE: u8 = 19;
/// Comparisons, IN and BETWEEN.
pub const PREC_CMP: u8 = 20;
pub const PREC_ADD: u8 = 30;
pub const PREC_MUL: u8 = 40;
/// Prefix sign; its operand must bind tighter than `*`.
pub const PREC_SIGN: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    StringConcat,
}

impl BinaryOperator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::StringConcat => "||",
        }
    }

    /// Binding strength; higher binds tighter. Matches the levels the parser front-end uses.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Or => PREC_OR,
            BinaryOperator::And => PREC_AND,
            BinaryOperator::Eq
            | BinaryOperator::NotEq
            | BinaryOperator::Lt
            | BinaryOperator::LtEq
            | BinaryOperator::Gt
            | BinaryOperator::GtEq => PREC_CMP,
            BinaryOperator::Plus | BinaryOperator::Minus => PREC_ADD,
            BinaryOperator::Multiply
            | BinaryOperator::Divide
            | BinaryOperator::Modulo
            | BinaryOperator::StringConcat => PREC_MUL,
        }
    }

    pub fn is_associative(&self) -> bool {
        matches!(
            self,
            BinaryOperator::And
                | BinaryOperator::Or
                | BinaryOperator::Plus
                | BinaryOperator::Multiply
                | BinaryOperator::StringConcat
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Minus,
    Plus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: ObjectName,
    pub args: Vec<Expr>,
    pub distinct: bool,
}

impl FunctionCall {
    pub fn is_aggregate(&self) -> bool {
        if self.distinct {
            return true;
        }
        match self.name.base() {
            Some(base) => matches!(
                base.value.to_ascii_lowercase().as_str(),
                "count" | "sum" | "avg" | "min" | "max"
            ),
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(ColumnRef),
    Literal(Literal),
    BinaryOp { left: Box<Expr>, op: BinaryOperator, right: Box<Expr> },
    UnaryOp { op: UnaryOperator, expr: Box<Expr> },
    Function(FunctionCall),
    /// Bare `*`, only meaningful as a function argument (`count(*)`).
    Star,
    Nested(Box<Expr>),
    IsNull { expr: Box<Expr>, negated: bool },
    InList { expr: Box<Expr>, list: Vec<Expr>, negated: bool },
    Between { expr: Box<Expr>, low: Box<Expr>, high: Box<Expr>, negated: bool },
    Like { expr: Box<Expr>, pattern: Box<Expr>, negated: bool, case_insensitive: bool },
    Case { operand: Option<Box<Expr>>, branches: Vec<(Expr, Expr)>, else_result: Option<Box<Expr>> },
    Cast { expr: Box<Expr>, data_type: String },
    /// Anything outside the supported subset; carries the source text for diagnostics.
    Unsupported(String),
}

impl Expr {
    pub fn column(qualifier: &str, name: &str) -> Self {
        Expr::Column(ColumnRef::qualified(qualifier, name))
    }

    pub fn bare_column(name: &str) -> Self {
        Expr::Column(ColumnRef::bare(name))
    }

    pub fn number(n: impl fmt::Display) -> Self {
        Expr::Literal(Literal::Number(n.to_string()))
    }

    pub fn string(s: &str) -> Self {
        Expr::Literal(Literal::String(s.to_string()))
    }

    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Expr::BinaryOp { left: Box::new(left), op, right: Box::new(right) }
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOperator::And, right)
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOperator::Or, right)
    }

    pub fn equals(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOperator::Eq, right)
    }

    /// Direct children in source (left-to-right) order.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Column(_) | Expr::Literal(_) | Expr::Star | Expr::Unsupported(_) => Vec::new(),
            Expr::BinaryOp { left, right, .. } => vec![&**left, &**right],
            Expr::UnaryOp { expr, .. }
            | Expr::Nested(expr)
            | Expr::IsNull { expr, .. }
            | Expr::Cast { expr, .. } => vec![&**expr],
            Expr::Function(f) => f.args.iter().collect(),
            Expr::InList { expr, list, .. } => {
                let mut out: Vec<&Expr> = vec![&**expr];
                out.extend(list.iter());
                out
            }
            Expr::Between { expr, low, high, .. } => vec![&**expr, &**low, &**high],
            Expr::Like { expr, pattern, .. } => vec![&**expr, &**pattern],
            Expr::Case { operand, branches, else_result } => {
                let mut out: Vec<&Expr> = Vec::new();
                if let Some(op) = operand {
                    out.push(&**op);
                }
                for (when, then) in branches {
                    out.push(when);
                    out.push(then);
                }
                if let Some(e) = else_result {
                    out.push(&**e);
                }
                out
            }
        }
    }

    /// Column references in left-to-right order.
    pub fn columns(&self) -> Vec<&ColumnRef> {
        fn rec<'a>(e: &'a Expr, out: &mut Vec<&'a ColumnRef>) {
            if let Expr::Column(c) = e {
                out.push(c);
            }
            for child in e.children() {
                rec(child, out);
            }
        }
        let mut out = Vec::new();
        rec(self, &mut out);
        out
    }

    /// First unsupported construct found in the subtree, if any.
    pub fn find_unsupported(&self) -> Option<&str> {
        match self {
            Expr::Unsupported(text) => Some(text.as_str()),
            other => other.children().into_iter().find_map(Expr::find_unsupported),
        }
    }

    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expr::Function(f) if f.is_aggregate() => true,
            other => other.children().into_iter().any(Expr::contains_aggregate),
        }
    }

    /// Binding strength of the node's outermost operator, used when rendering operands.
    pub fn precedence(&self) -> u8 {
        match self {
            Expr::BinaryOp { op, .. } => op.precedence(),
            Expr::UnaryOp { op: UnaryOperator::Not, .. } => PREC_NOT,
            Expr::UnaryOp { .. } => PREC_SIGN,
            Expr::IsNull { .. } => PREC_IS,
            Expr::Like { .. } => PREC_LIKE,
            Expr::InList { .. } | Expr::Between { .. } => PREC_CMP,
            _ => u8::MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Expr { expr: Expr, alias: Option<Ident> },
    Wildcard,
    QualifiedWildcard(ObjectName),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Cross,
    Left,
    Right,
    Full,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinConstraint {
    On(Expr),
    Using(Vec<Ident>),
    Natural,
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableFactor {
    Table(TableRef),
    /// Subquery in FROM position.
    Derived { alias: Option<Ident> },
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub relation: TableFactor,
    pub kind: JoinKind,
    pub constraint: JoinConstraint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FromItem {
    pub relation: TableFactor,
    pub joins: Vec<Join>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expr: Expr,
    pub asc: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectQuery {
    pub projection: Vec<SelectItem>,
    pub from: Vec<FromItem>,
    pub selection: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderByItem>,
}

impl SelectQuery {
    /// Every relation in FROM/JOIN position, in source order.
    pub fn relations(&self) -> Vec<&TableFactor> {
        let mut out = Vec::new();
        for item in &self.from {
            out.push(&item.relation);
            out.extend(item.joins.iter().map(|j| &j.relation));
        }
        out
    }

    pub fn joins(&self) -> impl Iterator<Item = &Join> {
        self.from.iter().flat_map(|item| item.joins.iter())
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&GenericDialect.render_ident(self))
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&ExprEmitter::generic().emit_object_name(self))
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&ExprEmitter::generic().emit_column(self))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&ExprEmitter::generic().emit_expr(self))
    }
}

// Output structures serialize identifiers and column references as SQL text.
impl Serialize for Ident {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for ObjectName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for ColumnRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
