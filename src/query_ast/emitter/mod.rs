use super::ast::{
    BinaryOperator, ColumnRef, Expr, Literal, ObjectName, PREC_CMP, PREC_IS, PREC_LIKE, PREC_NOT, PREC_SIGN,
    UnaryOperator,
};
use super::logical::TablePlan;

pub mod dialect;
use dialect::{GenericDialect, SqlDialect};

/// Render a table plan as `SELECT <cols> FROM <table>[ AS <alias>][ WHERE ...]`.
pub fn emit_table_plan(plan: &TablePlan, dialect: &dyn SqlDialect) -> String {
    let emitter = ExprEmitter::new(dialect);
    let alias = &plan.alias;

    let select_list = if plan.wildcard || plan.projected_columns.is_empty() {
        "*".to_string()
    } else {
        plan.projected_columns
            .iter()
            .map(|c| format!("{}.{}", dialect.render_ident(alias), dialect.render_ident(c)))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut sql = format!("SELECT {} FROM {}", select_list, emitter.emit_object_name(&plan.source_table));
    if plan.needs_alias_clause() {
        sql.push_str(&format!(" AS {}", dialect.render_ident(alias)));
    }

    let atoms: Vec<&Expr> = plan.pushed_predicates.iter().map(|atom| &atom.expr).collect();
    if let Some(predicate) = conjoin(&atoms) {
        sql.push_str(&format!(" WHERE {}", emitter.emit_expr(&predicate)));
    }
    sql
}

pub struct ExprEmitter<'a> {
    dialect: &'a dyn SqlDialect,
}

impl ExprEmitter<'static> {
    pub fn generic() -> Self {
        ExprEmitter { dialect: &GenericDialect }
    }
}

impl<'a> ExprEmitter<'a> {
    pub fn new(dialect: &'a dyn SqlDialect) -> Self {
        ExprEmitter { dialect }
    }

    pub fn emit_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Column(c) => self.emit_column(c),
            Expr::Literal(lit) => self.emit_literal(lit),
            Expr::BinaryOp { left, op, right } => {
                let prec = op.precedence();
                let l = self.emit_operand(left, prec);
                // Equal binding on the right only reads back the same for a repeated associative operator.
                let chained = matches!(&**right, Expr::BinaryOp { op: r, .. } if r == op) && op.is_associative();
                let r = if chained { self.emit_operand(right, prec) } else { self.emit_tight_operand(right, prec) };
                match op {
                    BinaryOperator::StringConcat => self.dialect.emit_concat(&l, &r),
                    _ => format!("{} {} {}", l, op.as_sql(), r),
                }
            }
            Expr::UnaryOp { op, expr: inner } => match op {
                UnaryOperator::Not => format!("NOT {}", self.emit_operand(inner, PREC_NOT)),
                UnaryOperator::Minus => Self::signed('-', self.emit_operand(inner, PREC_SIGN)),
                UnaryOperator::Plus => Self::signed('+', self.emit_operand(inner, PREC_SIGN)),
            },
            Expr::Function(f) => {
                let args = f.args.iter().map(|a| self.emit_expr(a)).collect::<Vec<_>>().join(", ");
                let distinct = if f.distinct { "DISTINCT " } else { "" };
                format!("{}({}{})", self.emit_object_name(&f.name), distinct, args)
            }
            Expr::Star => "*".into(),
            Expr::Nested(inner) => format!("({})", self.emit_expr(inner)),
            Expr::IsNull { expr: inner, negated } => {
                let e = self.emit_operand(inner, PREC_IS);
                if *negated { format!("{} IS NOT NULL", e) } else { format!("{} IS NULL", e) }
            }
            Expr::InList { expr: inner, list, negated } => {
                let items = list.iter().map(|e| self.emit_expr(e)).collect::<Vec<_>>().join(", ");
                let e = self.emit_operand(inner, PREC_CMP);
                if *negated { format!("{} NOT IN ({})", e, items) } else { format!("{} IN ({})", e, items) }
            }
            Expr::Between { expr: inner, low, high, negated } => format!(
                "{} {}BETWEEN {} AND {}",
                self.emit_operand(inner, PREC_CMP),
                if *negated { "NOT " } else { "" },
                self.emit_tight_operand(low, PREC_CMP),
                self.emit_tight_operand(high, PREC_CMP)
            ),
            Expr::Like { expr: inner, pattern, negated, case_insensitive } => {
                let e = self.emit_operand(inner, PREC_LIKE);
                let p = self.emit_tight_operand(pattern, PREC_LIKE);
                if *case_insensitive {
                    self.dialect.emit_ilike(&e, &p, *negated)
                } else if *negated {
                    format!("{} NOT LIKE {}", e, p)
                } else {
                    format!("{} LIKE {}", e, p)
                }
            }
            Expr::Case { operand, branches, else_result } => {
                let mut s = String::from("CASE");
                if let Some(op) = operand {
                    s.push(' ');
                    s.push_str(&self.emit_expr(op));
                }
                for (w, t) in branches {
                    s.push_str(&format!(" WHEN {} THEN {}", self.emit_expr(w), self.emit_expr(t)));
                }
                if let Some(e2) = else_result {
                    s.push_str(&format!(" ELSE {}", self.emit_expr(e2)));
                }
                s.push_str(" END");
                s
            }
            Expr::Cast { expr: inner, data_type } => format!("CAST({} AS {})", self.emit_expr(inner), data_type),
            Expr::Unsupported(raw) => raw.clone(),
        }
    }

    /// Left-hand operand of an operator binding at `parent`; parenthesized when it binds looser.
    fn emit_operand(&self, operand: &Expr, parent: u8) -> String {
        let text = self.emit_expr(operand);
        if operand.precedence() < parent { format!("({})", text) } else { text }
    }

    /// Operand the parser reads at `parent` strength (right side, BETWEEN bounds, LIKE pattern):
    /// equal binding needs parentheses too.
    fn emit_tight_operand(&self, operand: &Expr, parent: u8) -> String {
        let text = self.emit_expr(operand);
        if operand.precedence() <= parent { format!("({})", text) } else { text }
    }

    /// `-x`, with a space before an operand that itself starts with a sign so `--` never appears.
    fn signed(sign: char, operand: String) -> String {
        if operand.starts_with(['-', '+']) { format!("{} {}", sign, operand) } else { format!("{}{}", sign, operand) }
    }

    fn emit_literal(&self, lit: &Literal) -> String {
        match lit {
            Literal::Number(n) => n.clone(),
            Literal::String(s) => self.dialect.quote_string(s),
            Literal::Boolean(b) => self.dialect.emit_boolean(*b),
            Literal::Null => self.dialect.emit_null(),
        }
    }

    pub fn emit_column(&self, col: &ColumnRef) -> String {
        match &col.qualifier {
            Some(q) => format!("{}.{}", self.emit_object_name(q), self.dialect.render_ident(&col.name)),
            None => self.dialect.render_ident(&col.name),
        }
    }

    pub fn emit_object_name(&self, name: &ObjectName) -> String {
        name.0.iter().map(|p| self.dialect.render_ident(p)).collect::<Vec<_>>().join(".")
    }
}

/// Left-deep AND chain over `exprs`; operand rendering parenthesizes any disjunction.
pub fn conjoin(exprs: &[&Expr]) -> Option<Expr> {
    let mut iter = exprs.iter();
    let first = (*iter.next()?).clone();
    Some(iter.fold(first, |acc, next| Expr::binary(acc, BinaryOperator::And, (*next).clone())))
}
