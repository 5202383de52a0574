#[cfg(feature = "query_ast")]
mod query_ast_tests {
    use fedsplit::query_ast::{DecompositionError, PredicateSource, ReferencedTable, decompose_sql};

    fn sqls(atoms: &[fedsplit::query_ast::PredicateAtom]) -> Vec<String> {
        atoms.iter().map(|a| a.sql()).collect()
    }

    fn names(cols: &[fedsplit::query_ast::ast::Ident]) -> Vec<String> {
        cols.iter().map(|c| c.value.clone()).collect()
    }

    const EMPLOYEE_DEPT: &str = "SELECT a.id, a.name, b.dept FROM employee a JOIN department b ON a.dept_id = b.id AND b.active = true WHERE a.status = 'active' AND b.dept = 'Sales'";

    #[test]
    fn employee_department_join() {
        let plan = decompose_sql(EMPLOYEE_DEPT).expect("ok");
        assert_eq!(plan.table_plans.len(), 2);

        let a = plan.table_plan("a").expect("plan a");
        assert_eq!(names(&a.projected_columns), ["dept_id", "id", "name", "status"]);
        assert_eq!(sqls(&a.pushed_predicates), ["a.status = 'active'"]);
        assert_eq!(a.synthesized_sql, "SELECT a.dept_id, a.id, a.name, a.status FROM employee AS a WHERE a.status = 'active'");

        let b = plan.table_plan("b").expect("plan b");
        assert_eq!(names(&b.projected_columns), ["active", "dept", "id"]);
        assert_eq!(sqls(&b.pushed_predicates), ["b.dept = 'Sales'", "b.active = TRUE"]);
        assert_eq!(b.synthesized_sql, "SELECT b.active, b.dept, b.id FROM department AS b WHERE b.dept = 'Sales' AND b.active = TRUE");

        assert_eq!(sqls(&plan.residual_predicates), ["a.dept_id = b.id"]);
        let join_atom = &plan.residual_predicates[0];
        assert_eq!(join_atom.source, PredicateSource::JoinOn(0));
        assert_eq!(
            join_atom.referenced_tables.iter().cloned().collect::<Vec<_>>(),
            [ReferencedTable::Alias("a".into()), ReferencedTable::Alias("b".into())]
        );
        assert!(plan.ambiguous_columns.is_empty());
        assert!(plan.residual_projections.is_empty());
        assert_eq!(plan.residual_predicate().map(|e| e.to_string()).as_deref(), Some("a.dept_id = b.id"));
    }

    #[test]
    fn or_predicate_is_one_atom() {
        let plan = decompose_sql("SELECT x FROM t WHERE x > 1 OR x < 0").expect("ok");
        let t = plan.table_plan("t").expect("implicit alias t");
        assert!(!t.explicit_alias);
        assert_eq!(sqls(&t.pushed_predicates), ["x > 1 OR x < 0"]);
        assert_eq!(t.synthesized_sql, "SELECT t.x FROM t WHERE x > 1 OR x < 0");
        assert!(plan.residual_predicates.is_empty());
    }

    #[test]
    fn alias_presence_variations() {
        let plan = decompose_sql("SELECT * FROM t1 a, t2 b WHERE a.id = b.id").expect("ok");
        assert_eq!(plan.table_plan("a").expect("a").synthesized_sql, "SELECT * FROM t1 AS a");
        assert_eq!(plan.table_plan("b").expect("b").synthesized_sql, "SELECT * FROM t2 AS b");
        assert_eq!(sqls(&plan.residual_predicates), ["a.id = b.id"]);

        assert_eq!(decompose_sql("SELECT * FROM t1, t2 b WHERE t1.id = b.id").unwrap_err(), DecompositionError::MissingAlias("t1".into()));
        assert_eq!(decompose_sql("SELECT * FROM t1 a, t2 a").unwrap_err(), DecompositionError::DuplicateAlias("a".into()));
        assert_eq!(
            decompose_sql("SELECT * FROM t1 a JOIN t2 A ON a.id = A.id").unwrap_err(),
            DecompositionError::DuplicateAlias("A".into())
        );
    }

    #[test]
    fn single_table_keeps_schema_and_implicit_alias() {
        let plan = decompose_sql("SELECT id FROM hr.employee WHERE id > 5").expect("ok");
        let e = plan.table_plan("employee").expect("implicit alias");
        assert_eq!(e.source_table.to_string(), "hr.employee");
        assert_eq!(e.synthesized_sql, "SELECT employee.id FROM hr.employee WHERE id > 5");

        let plan = decompose_sql("SELECT hr.employee.id FROM hr.employee").expect("ok");
        assert_eq!(plan.table_plan("employee").expect("plan").synthesized_sql, "SELECT employee.id FROM hr.employee");
        assert!(plan.ambiguous_columns.is_empty());
    }

    #[test]
    fn explicit_alias_equal_to_table_name_is_kept() {
        let plan = decompose_sql("SELECT employee.id FROM employee AS employee").expect("ok");
        assert_eq!(plan.table_plan("employee").expect("plan").synthesized_sql, "SELECT employee.id FROM employee AS employee");
    }

    #[test]
    fn unqualified_columns_in_multi_table_query_are_residual() {
        let plan = decompose_sql("SELECT id, a.name FROM t1 a JOIN t2 b ON a.k = b.k WHERE status = 1").expect("ok");
        let ambiguous: Vec<String> = plan.ambiguous_columns.iter().map(|c| c.to_string()).collect();
        assert_eq!(ambiguous, ["id", "status"]);
        assert_eq!(plan.residual_projections, plan.ambiguous_columns);
        assert_eq!(sqls(&plan.residual_predicates), ["status = 1", "a.k = b.k"]);
        assert!(plan.residual_predicates[0].referenced_tables.contains(&ReferencedTable::Unresolved));
        assert_eq!(plan.table_plan("a").expect("a").synthesized_sql, "SELECT a.k, a.name FROM t1 AS a");
        assert_eq!(plan.table_plan("b").expect("b").synthesized_sql, "SELECT b.k FROM t2 AS b");
    }

    #[test]
    fn unknown_qualifier_is_flagged_not_dropped() {
        let plan = decompose_sql("SELECT z.id, a.id FROM t1 a, t2 b WHERE z.id = 3").expect("ok");
        let ambiguous: Vec<String> = plan.ambiguous_columns.iter().map(|c| c.to_string()).collect();
        assert_eq!(ambiguous, ["z.id"]);
        assert_eq!(sqls(&plan.residual_predicates), ["z.id = 3"]);
        assert!(plan.table_plan("b").expect("b").wildcard);
    }

    #[test]
    fn outer_join_keeps_unsafe_atoms_residual() {
        let sql = "SELECT a.id FROM t1 a LEFT JOIN t2 b ON a.id = b.id AND b.flag = 1 AND a.kind = 2 WHERE b.score > 3 AND a.x = 1";
        let plan = decompose_sql(sql).expect("ok");
        assert_eq!(sqls(&plan.table_plan("a").expect("a").pushed_predicates), ["a.x = 1"]);
        assert_eq!(sqls(&plan.table_plan("b").expect("b").pushed_predicates), ["b.flag = 1"]);
        assert_eq!(sqls(&plan.residual_predicates), ["b.score > 3", "a.id = b.id", "a.kind = 2"]);
    }

    #[test]
    fn having_aggregates_stay_residual_and_output_aliases_are_not_columns() {
        let sql = "SELECT a.dept, count(*) AS n FROM emp a JOIN dept d ON a.d = d.id GROUP BY a.dept HAVING count(*) > 2 AND a.dept <> 'x' ORDER BY n";
        let plan = decompose_sql(sql).expect("ok");
        assert!(plan.ambiguous_columns.is_empty());
        assert_eq!(sqls(&plan.table_plan("a").expect("a").pushed_predicates), ["a.dept <> 'x'"]);
        assert_eq!(sqls(&plan.residual_predicates), ["count(*) > 2", "a.d = d.id"]);
        assert_eq!(plan.residual_predicates[0].source, PredicateSource::Having);
    }

    #[test]
    fn quoted_identifiers_and_literals_round_trip() {
        let sql = r#"SELECT "T"."Name" FROM "Users" "T" WHERE "T"."Name" = 'O''Brien'"#;
        let plan = decompose_sql(sql).expect("ok");
        let t = plan.table_plan("\"T\"").expect("quoted alias");
        assert_eq!(t.synthesized_sql, r#"SELECT "T"."Name" FROM "Users" AS "T" WHERE "T"."Name" = 'O''Brien'"#);
    }

    #[test]
    fn qualified_wildcard_marks_one_table() {
        let plan = decompose_sql("SELECT a.*, b.name FROM t1 a JOIN t2 b ON a.id = b.id").expect("ok");
        assert_eq!(plan.table_plan("a").expect("a").synthesized_sql, "SELECT * FROM t1 AS a");
        assert_eq!(plan.table_plan("b").expect("b").synthesized_sql, "SELECT b.id, b.name FROM t2 AS b");
        assert!(matches!(decompose_sql("SELECT q.* FROM t1 a").unwrap_err(), DecompositionError::ParseOrScope(_)));
    }

    #[test]
    fn pushed_disjunction_is_parenthesized_next_to_other_atoms() {
        let plan = decompose_sql("SELECT * FROM t WHERE (x > 1 OR y < 0) AND z = 2").expect("ok");
        assert_eq!(plan.table_plan("t").expect("t").synthesized_sql, "SELECT * FROM t WHERE (x > 1 OR y < 0) AND z = 2");
    }

    #[test]
    fn synthesized_queries_are_idempotent() {
        let plan = decompose_sql(EMPLOYEE_DEPT).expect("ok");
        for (alias, table_plan) in &plan.table_plans {
            let again = decompose_sql(&table_plan.synthesized_sql).expect("re-parse");
            assert!(again.residual_predicates.is_empty(), "residual left for {alias}");
            let only = again.table_plan(alias).expect("same alias");
            assert_eq!(sqls(&only.pushed_predicates), sqls(&table_plan.pushed_predicates));
            assert_eq!(only.projected_columns, table_plan.projected_columns);
            assert_eq!(only.synthesized_sql, table_plan.synthesized_sql);
        }
    }

    #[test]
    fn double_negation_survives_resynthesis() {
        let plan = decompose_sql("SELECT x FROM t WHERE x > - -1").expect("ok");
        let sql = &plan.table_plan("t").expect("t").synthesized_sql;
        assert_eq!(sql, "SELECT t.x FROM t WHERE x > - -1");
        let again = decompose_sql(sql).expect("re-parse");
        assert_eq!(&again.table_plan("t").expect("t").synthesized_sql, sql);
    }

    #[test]
    fn doubly_parenthesized_conjunction_is_split() {
        let plan = decompose_sql("SELECT * FROM t1 a, t2 b WHERE ((a.x = 1 AND b.y = 2))").expect("ok");
        assert_eq!(sqls(&plan.table_plan("a").expect("a").pushed_predicates), ["a.x = 1"]);
        assert_eq!(sqls(&plan.table_plan("b").expect("b").pushed_predicates), ["b.y = 2"]);
        assert!(plan.residual_predicates.is_empty());
    }

    #[test]
    fn column_spellings_differing_in_case_are_one_column() {
        let plan = decompose_sql("SELECT a.ID FROM t a WHERE a.id = 1").expect("ok");
        let a = plan.table_plan("a").expect("a");
        assert_eq!(names(&a.projected_columns), ["ID"]);
        assert_eq!(a.synthesized_sql, "SELECT a.ID FROM t AS a WHERE a.id = 1");

        let quoted = decompose_sql(r#"SELECT a."ID", a.id FROM t a"#).expect("ok");
        assert_eq!(quoted.table_plan("a").expect("a").projected_columns.len(), 2);
    }

    #[test]
    fn unsupported_constructs_are_rejected() {
        for sql in [
            "SELECT * FROM (SELECT 1) s",
            "SELECT a.id FROM t a WHERE a.id IN (SELECT id FROM u)",
            "SELECT id FROM a UNION SELECT id FROM b",
            "SELECT * FROM t1 a JOIN t2 b USING (id)",
            "WITH c AS (SELECT 1) SELECT * FROM c",
            "DELETE FROM t",
        ] {
            let err = decompose_sql(sql).unwrap_err();
            assert!(matches!(err, DecompositionError::UnsupportedConstruct(_)), "{sql}: {err:?}");
        }
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        assert!(matches!(decompose_sql("SELEC id FROM").unwrap_err(), DecompositionError::ParseOrScope(_)));
        assert!(matches!(decompose_sql("SELECT 1").unwrap_err(), DecompositionError::ParseOrScope(_)));
        assert!(matches!(decompose_sql("").unwrap_err(), DecompositionError::ParseOrScope(_)));
    }

    #[test]
    fn plan_serializes_as_sql_text() {
        let plan = decompose_sql(EMPLOYEE_DEPT).expect("ok");
        let json = serde_json::to_value(&plan).expect("json");
        assert_eq!(json["table_plans"]["a"]["alias"], "a");
        assert_eq!(json["table_plans"]["a"]["source_table"], "employee");
        assert_eq!(json["table_plans"]["b"]["pushed_predicates"][0]["sql"], "b.dept = 'Sales'");
        assert_eq!(json["table_plans"]["b"]["pushed_predicates"][0]["source"], "where");
        assert_eq!(json["residual_predicates"][0]["source"]["join_on"], 0);
        assert_eq!(json["residual_predicates"][0]["referenced_tables"], serde_json::json!(["a", "b"]));

        let ambiguous = decompose_sql("SELECT a.id FROM t1 a, t2 b WHERE status = 1").expect("ok");
        let json = serde_json::to_value(&ambiguous).expect("json");
        assert_eq!(json["residual_predicates"][0]["referenced_tables"], serde_json::json!(["<unresolved>"]));
    }
}
