use super::{
    ast::{
        BinaryOperator, ColumnRef, Expr, FromItem, FunctionCall, Ident, Join, JoinConstraint, JoinKind, Literal,
        ObjectName, OrderByItem, SelectItem, SelectQuery, TableFactor, TableRef, UnaryOperator,
    },
    errors::DecompositionError,
};
use sqlparser::ast as sq;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// Parse SQL text holding exactly one plain SELECT into the decomposition tree.
pub fn parse_select(sql: &str) -> Result<SelectQuery, DecompositionError> {
    let dialect = GenericDialect {};
    let ast = Parser::parse_sql(&dialect, sql).map_err(|e| DecompositionError::ParseOrScope(e.to_string()))?;
    match ast.as_slice() {
        [] => Err(DecompositionError::ParseOrScope("empty input".into())),
        [sq::Statement::Query(q)] => convert_query(q),
        [_] => Err(DecompositionError::unsupported("not a SELECT")),
        _ => Err(DecompositionError::unsupported("multi-statement input")),
    }
}

fn convert_query(q: &sq::Query) -> Result<SelectQuery, DecompositionError> {
    if q.with.is_some() {
        return Err(DecompositionError::unsupported("WITH (common table expressions)"));
    }
    let mut query = match q.body.as_ref() {
        sq::SetExpr::Select(sel) => convert_select(sel)?,
        sq::SetExpr::SetOperation { op, .. } => return Err(DecompositionError::unsupported(format!("set operation {}", op))),
        sq::SetExpr::Query(_) => return Err(DecompositionError::unsupported("parenthesized query body")),
        _ => return Err(DecompositionError::unsupported("unsupported query body")),
    };
    if let Some(ob) = &q.order_by {
        query.order_by = ob.exprs.iter().map(|obe| OrderByItem { expr: convert_expr(&obe.expr), asc: obe.asc.unwrap_or(true) }).collect();
    }
    Ok(query)
}

fn convert_select(sel: &sq::Select) -> Result<SelectQuery, DecompositionError> {
    if sel.top.is_some() { return Err(DecompositionError::unsupported("SELECT TOP")); }
    if sel.into.is_some() { return Err(DecompositionError::unsupported("SELECT INTO")); }
    if !sel.lateral_views.is_empty() { return Err(DecompositionError::unsupported("LATERAL VIEW")); }
    if sel.qualify.is_some() { return Err(DecompositionError::unsupported("QUALIFY")); }

    // FROM + JOIN chains
    let mut from = Vec::with_capacity(sel.from.len());
    for twj in &sel.from {
        let mut joins = Vec::with_capacity(twj.joins.len());
        for join in &twj.joins {
            let (kind, constraint) = match &join.join_operator {
                sq::JoinOperator::Inner(c) => (JoinKind::Inner, convert_constraint(c)),
                sq::JoinOperator::LeftOuter(c) => (JoinKind::Left, convert_constraint(c)),
                sq::JoinOperator::RightOuter(c) => (JoinKind::Right, convert_constraint(c)),
                sq::JoinOperator::FullOuter(c) => (JoinKind::Full, convert_constraint(c)),
                sq::JoinOperator::CrossJoin => (JoinKind::Cross, JoinConstraint::None),
                _ => return Err(DecompositionError::unsupported("semi/anti/apply join")),
            };
            joins.push(Join { relation: convert_table_factor(&join.relation), kind, constraint });
        }
        from.push(FromItem { relation: convert_table_factor(&twj.relation), joins });
    }

    // PROJECTION
    let mut projection = Vec::with_capacity(sel.projection.len());
    for item in &sel.projection {
        projection.push(match item {
            sq::SelectItem::UnnamedExpr(e) => SelectItem::Expr { expr: convert_expr(e), alias: None },
            sq::SelectItem::ExprWithAlias { expr, alias } => SelectItem::Expr { expr: convert_expr(expr), alias: Some(convert_ident(alias)) },
            sq::SelectItem::Wildcard(_) => SelectItem::Wildcard,
            sq::SelectItem::QualifiedWildcard(name, _) => SelectItem::QualifiedWildcard(convert_object_name(name)),
        });
    }

    let group_by = match &sel.group_by {
        sq::GroupByExpr::Expressions(exprs, ..) => exprs.iter().map(convert_expr).collect(),
        sq::GroupByExpr::All(..) => return Err(DecompositionError::unsupported("GROUP BY ALL")),
    };

    Ok(SelectQuery {
        projection,
        from,
        selection: sel.selection.as_ref().map(convert_expr),
        group_by,
        having: sel.having.as_ref().map(convert_expr),
        order_by: Vec::new(),
    })
}

fn convert_constraint(c: &sq::JoinConstraint) -> JoinConstraint {
    match c {
        sq::JoinConstraint::On(e) => JoinConstraint::On(convert_expr(e)),
        sq::JoinConstraint::Using(cols) => JoinConstraint::Using(cols.iter().map(convert_ident).collect()),
        sq::JoinConstraint::Natural => JoinConstraint::Natural,
        sq::JoinConstraint::None => JoinConstraint::None,
    }
}

fn convert_table_factor(tf: &sq::TableFactor) -> TableFactor {
    match tf {
        sq::TableFactor::Table { name, alias, .. } => match alias {
            Some(a) if !a.columns.is_empty() => TableFactor::Unsupported(format!("table alias column list on {}", name)),
            _ => TableFactor::Table(TableRef { name: convert_object_name(name), alias: alias.as_ref().map(|a| convert_ident(&a.name)) }),
        },
        sq::TableFactor::Derived { alias, .. } => TableFactor::Derived { alias: alias.as_ref().map(|a| convert_ident(&a.name)) },
        sq::TableFactor::NestedJoin { .. } => TableFactor::Unsupported("parenthesized join".into()),
        other => TableFactor::Unsupported(other.to_string()),
    }
}

fn convert_ident(id: &sq::Ident) -> Ident {
    Ident { value: id.value.clone(), quote_style: id.quote_style }
}

fn convert_object_name(name: &sq::ObjectName) -> ObjectName {
    ObjectName(name.0.iter().map(convert_ident).collect())
}

fn convert_binary_op(op: &sq::BinaryOperator) -> Option<BinaryOperator> {
    Some(match op {
        sq::BinaryOperator::Eq => BinaryOperator::Eq,
        sq::BinaryOperator::NotEq => BinaryOperator::NotEq,
        sq::BinaryOperator::Lt => BinaryOperator::Lt,
        sq::BinaryOperator::LtEq => BinaryOperator::LtEq,
        sq::BinaryOperator::Gt => BinaryOperator::Gt,
        sq::BinaryOperator::GtEq => BinaryOperator::GtEq,
        sq::BinaryOperator::And => BinaryOperator::And,
        sq::BinaryOperator::Or => BinaryOperator::Or,
        sq::BinaryOperator::Plus => BinaryOperator::Plus,
        sq::BinaryOperator::Minus => BinaryOperator::Minus,
        sq::BinaryOperator::Multiply => BinaryOperator::Multiply,
        sq::BinaryOperator::Divide => BinaryOperator::Divide,
        sq::BinaryOperator::Modulo => BinaryOperator::Modulo,
        sq::BinaryOperator::StringConcat => BinaryOperator::StringConcat,
        _ => return None,
    })
}

/// Map a parser expression onto the tree. Anything outside the supported subset
/// becomes `Expr::Unsupported` carrying its text; the engine rejects it when it walks there.
fn convert_expr(e: &sq::Expr) -> Expr {
    match e {
        sq::Expr::Identifier(id) => Expr::Column(ColumnRef { qualifier: None, name: convert_ident(id) }),
        sq::Expr::CompoundIdentifier(parts) => match parts.split_last() {
            Some((name, [])) => Expr::Column(ColumnRef { qualifier: None, name: convert_ident(name) }),
            Some((name, qualifier)) => Expr::Column(ColumnRef {
                qualifier: Some(ObjectName(qualifier.iter().map(convert_ident).collect())),
                name: convert_ident(name),
            }),
            None => Expr::Unsupported(e.to_string()),
        },
        sq::Expr::Value(sq::Value::Number(n, _)) => Expr::Literal(Literal::Number(n.clone())),
        sq::Expr::Value(sq::Value::SingleQuotedString(s)) => Expr::Literal(Literal::String(s.clone())),
        sq::Expr::Value(sq::Value::Boolean(b)) => Expr::Literal(Literal::Boolean(*b)),
        sq::Expr::Value(sq::Value::Null) => Expr::Literal(Literal::Null),
        sq::Expr::BinaryOp { left, op, right } => match convert_binary_op(op) {
            Some(op) => Expr::BinaryOp { left: Box::new(convert_expr(left)), op, right: Box::new(convert_expr(right)) },
            None => Expr::Unsupported(e.to_string()),
        },
        sq::Expr::UnaryOp { op, expr } => {
            let op = match op {
                sq::UnaryOperator::Not => UnaryOperator::Not,
                sq::UnaryOperator::Minus => UnaryOperator::Minus,
                sq::UnaryOperator::Plus => UnaryOperator::Plus,
                _ => return Expr::Unsupported(e.to_string()),
            };
            Expr::UnaryOp { op, expr: Box::new(convert_expr(expr)) }
        }
        sq::Expr::Nested(inner) => Expr::Nested(Box::new(convert_expr(inner))),
        sq::Expr::Function(func) => {
            if func.over.is_some() || func.filter.is_some() {
                return Expr::Unsupported(e.to_string());
            }
            let mut args = Vec::new();
            let mut distinct = false;
            match &func.args {
                sq::FunctionArguments::None => {}
                sq::FunctionArguments::List(list) => {
                    if !list.clauses.is_empty() {
                        return Expr::Unsupported(e.to_string());
                    }
                    distinct = matches!(list.duplicate_treatment, Some(sq::DuplicateTreatment::Distinct));
                    for a in &list.args {
                        match a {
                            sq::FunctionArg::Unnamed(sq::FunctionArgExpr::Expr(ex)) => args.push(convert_expr(ex)),
                            sq::FunctionArg::Unnamed(sq::FunctionArgExpr::Wildcard) => args.push(Expr::Star),
                            _ => return Expr::Unsupported(e.to_string()),
                        }
                    }
                }
                sq::FunctionArguments::Subquery(_) => return Expr::Unsupported(e.to_string()),
            }
            Expr::Function(FunctionCall { name: convert_object_name(&func.name), args, distinct })
        }
        sq::Expr::IsNull(inner) => Expr::IsNull { expr: Box::new(convert_expr(inner)), negated: false },
        sq::Expr::IsNotNull(inner) => Expr::IsNull { expr: Box::new(convert_expr(inner)), negated: true },
        sq::Expr::InList { expr, list, negated } => Expr::InList {
            expr: Box::new(convert_expr(expr)),
            list: list.iter().map(convert_expr).collect(),
            negated: *negated,
        },
        sq::Expr::Between { expr, negated, low, high } => Expr::Between {
            expr: Box::new(convert_expr(expr)),
            low: Box::new(convert_expr(low)),
            high: Box::new(convert_expr(high)),
            negated: *negated,
        },
        sq::Expr::Like { negated, expr, pattern, escape_char: None, .. } => Expr::Like {
            expr: Box::new(convert_expr(expr)),
            pattern: Box::new(convert_expr(pattern)),
            negated: *negated,
            case_insensitive: false,
        },
        sq::Expr::ILike { negated, expr, pattern, escape_char: None, .. } => Expr::Like {
            expr: Box::new(convert_expr(expr)),
            pattern: Box::new(convert_expr(pattern)),
            negated: *negated,
            case_insensitive: true,
        },
        sq::Expr::Case { operand, conditions, results, else_result } => Expr::Case {
            operand: operand.as_ref().map(|o| Box::new(convert_expr(o))),
            branches: conditions.iter().zip(results.iter()).map(|(c, r)| (convert_expr(c), convert_expr(r))).collect(),
            else_result: else_result.as_ref().map(|e2| Box::new(convert_expr(e2))),
        },
        sq::Expr::Cast { kind: sq::CastKind::Cast | sq::CastKind::DoubleColon, expr, data_type, format: None } => {
            Expr::Cast { expr: Box::new(convert_expr(expr)), data_type: data_type.to_string() }
        }
        _ => Expr::Unsupported(e.to_string()),
    }
}
