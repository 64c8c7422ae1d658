// Copyright 2025 Csvql Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! SELECT pipeline tests
//!
//! Clause ordering, projection, DISTINCT, ORDER BY, OFFSET/LIMIT, and
//! field resolution errors over file-backed tables.

use std::fs;

use csvql::ast::*;
use csvql::executor::Session;
use csvql::{Value, View};
use tempfile::TempDir;

fn setup() -> (TempDir, Session) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    fs::write(
        dir.path().join("table1.csv"),
        "column1,column2\n1,str1\n2,str2\n3,str3\n",
    )
    .expect("failed to write fixture");
    let session = Session::with_dir(dir.path());
    (dir, session)
}

fn run_select(session: &mut Session, query: SelectQuery) -> View {
    session
        .execute(&[Statement::Select(query)])
        .expect("query failed");
    session.result_views()[0].clone()
}

fn rows(view: &View) -> Vec<Vec<String>> {
    view.records
        .iter()
        .map(|r| r.values().iter().map(|v| v.to_string()).collect())
        .collect()
}

fn from_table(table: &str) -> Option<FromClause> {
    Some(FromClause {
        tables: vec![Table::named(table)],
    })
}

#[test]
fn test_select_constant_from_dual() {
    let (_dir, mut session) = setup();
    let query = SelectQuery::entity(SelectEntity {
        fields: vec![Field::new(Expression::integer(1))],
        from: Some(FromClause {
            tables: vec![Table {
                object: TableObject::Dual,
                alias: None,
            }],
        }),
        ..Default::default()
    });
    let view = run_select(&mut session, query);
    assert_eq!(view.header.len(), 1);
    assert_eq!(view.header.get(0).column, "1");
    assert_eq!(rows(&view), vec![vec!["1".to_string()]]);
}

#[test]
fn test_select_star_preserves_file_order() {
    let (_dir, mut session) = setup();
    let query = SelectQuery::entity(SelectEntity {
        fields: vec![Field::new(Expression::all_columns())],
        from: from_table("table1"),
        ..Default::default()
    });
    let view = run_select(&mut session, query);
    assert_eq!(
        rows(&view),
        vec![
            vec!["1".to_string(), "str1".to_string()],
            vec!["2".to_string(), "str2".to_string()],
            vec!["3".to_string(), "str3".to_string()],
        ]
    );
    assert_eq!(view.header.get(0).view, "table1");
    assert_eq!(view.header.get(0).column, "column1");
}

#[test]
fn test_where_keeps_only_true() {
    let (_dir, mut session) = setup();
    let query = SelectQuery::entity(SelectEntity {
        fields: vec![Field::new(Expression::field("column2"))],
        from: from_table("table1"),
        where_clause: Some(Expression::comparison(
            Expression::field("column1"),
            ComparisonOp::Greater,
            Expression::integer(1),
        )),
        ..Default::default()
    });
    let view = run_select(&mut session, query);
    assert_eq!(
        rows(&view),
        vec![vec!["str2".to_string()], vec!["str3".to_string()]]
    );
}

#[test]
fn test_where_unknown_drops_record() {
    let (dir, mut session) = setup();
    fs::write(dir.path().join("nulls.csv"), "c1,c2\n1,a\n,b\n3,c\n")
        .expect("failed to write fixture");
    let query = SelectQuery::entity(SelectEntity {
        fields: vec![Field::new(Expression::field("c2"))],
        from: from_table("nulls"),
        where_clause: Some(Expression::comparison(
            Expression::field("c1"),
            ComparisonOp::Less,
            Expression::integer(10),
        )),
        ..Default::default()
    });
    // The NULL row compares UNKNOWN and is dropped
    let view = run_select(&mut session, query);
    assert_eq!(view.records.len(), 2);
}

#[test]
fn test_projection_alias_resolves_in_order_by() {
    let (_dir, mut session) = setup();
    let query = SelectQuery {
        body: SelectBody::Entity(SelectEntity {
            fields: vec![Field::aliased(Expression::field("column1"), "id")],
            from: from_table("table1"),
            ..Default::default()
        }),
        order_by: Some(OrderByClause {
            items: vec![OrderItem {
                expr: Expression::field("id"),
                direction: Some(SortDirection::Descending),
                nulls: None,
            }],
        }),
        ..Default::default()
    };
    let view = run_select(&mut session, query);
    assert_eq!(
        rows(&view),
        vec![
            vec!["3".to_string()],
            vec!["2".to_string()],
            vec!["1".to_string()],
        ]
    );
}

#[test]
fn test_order_by_source_column_not_in_projection() {
    let (_dir, mut session) = setup();
    let query = SelectQuery {
        body: SelectBody::Entity(SelectEntity {
            fields: vec![Field::new(Expression::field("column2"))],
            from: from_table("table1"),
            ..Default::default()
        }),
        order_by: Some(OrderByClause {
            items: vec![OrderItem {
                expr: Expression::field("column1"),
                direction: Some(SortDirection::Descending),
                nulls: None,
            }],
        }),
        ..Default::default()
    };
    let view = run_select(&mut session, query);
    assert_eq!(
        rows(&view),
        vec![
            vec!["str3".to_string()],
            vec!["str2".to_string()],
            vec!["str1".to_string()],
        ]
    );
}

#[test]
fn test_order_by_nulls_placement() {
    let (dir, mut session) = setup();
    fs::write(dir.path().join("nulls.csv"), "c1,c2\n2,a\n,b\n1,c\n")
        .expect("failed to write fixture");
    let query = SelectQuery {
        body: SelectBody::Entity(SelectEntity {
            fields: vec![Field::new(Expression::field("c1"))],
            from: from_table("nulls"),
            ..Default::default()
        }),
        order_by: Some(OrderByClause {
            items: vec![OrderItem {
                expr: Expression::field("c1"),
                direction: None,
                nulls: Some(NullsPosition::Last),
            }],
        }),
        ..Default::default()
    };
    let view = run_select(&mut session, query);
    assert_eq!(
        rows(&view),
        vec![
            vec!["1".to_string()],
            vec!["2".to_string()],
            vec!["NULL".to_string()],
        ]
    );
}

#[test]
fn test_offset_and_limit() {
    let (_dir, mut session) = setup();
    let query = SelectQuery {
        body: SelectBody::Entity(SelectEntity {
            fields: vec![Field::new(Expression::field("column1"))],
            from: from_table("table1"),
            ..Default::default()
        }),
        offset: Some(OffsetClause {
            value: Expression::integer(1),
        }),
        limit: Some(LimitClause {
            value: Expression::integer(1),
            percent: false,
        }),
        ..Default::default()
    };
    let view = run_select(&mut session, query);
    assert_eq!(rows(&view), vec![vec!["2".to_string()]]);
}

#[test]
fn test_limit_percent_rounds_up() {
    let (_dir, mut session) = setup();
    let query = SelectQuery {
        body: SelectBody::Entity(SelectEntity {
            fields: vec![Field::new(Expression::field("column1"))],
            from: from_table("table1"),
            ..Default::default()
        }),
        limit: Some(LimitClause {
            value: Expression::integer(50),
            percent: true,
        }),
        ..Default::default()
    };
    // ceil(3 * 50%) = 2
    let view = run_select(&mut session, query);
    assert_eq!(view.records.len(), 2);
}

#[test]
fn test_limit_not_integer_error() {
    let (_dir, mut session) = setup();
    let query = SelectQuery {
        body: SelectBody::Entity(SelectEntity {
            fields: vec![Field::new(Expression::field("column1"))],
            from: from_table("table1"),
            ..Default::default()
        }),
        limit: Some(LimitClause {
            value: Expression::string("abc"),
            percent: false,
        }),
        ..Default::default()
    };
    let err = session.execute(&[Statement::Select(query)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "[L:- C:-] limit value 'abc' is not an integer value"
    );
}

#[test]
fn test_distinct_collapses_spellings() {
    let (dir, mut session) = setup();
    fs::write(dir.path().join("dup.csv"), "c1\n1\n1\n2\n").expect("failed to write fixture");
    let query = SelectQuery::entity(SelectEntity {
        distinct: true,
        fields: vec![Field::new(Expression::field("c1"))],
        from: from_table("dup"),
        ..Default::default()
    });
    let view = run_select(&mut session, query);
    assert_eq!(view.records.len(), 2);
}

#[test]
fn test_field_does_not_exist() {
    let (_dir, mut session) = setup();
    let query = SelectQuery::entity(SelectEntity {
        fields: vec![Field::new(Expression::field("notexist"))],
        from: from_table("table1"),
        ..Default::default()
    });
    let err = session.execute(&[Statement::Select(query)]).unwrap_err();
    assert_eq!(err.to_string(), "[L:- C:-] field notexist does not exist");
}

#[test]
fn test_missing_table_error() {
    let (_dir, mut session) = setup();
    let query = SelectQuery::entity(SelectEntity {
        fields: vec![Field::new(Expression::all_columns())],
        from: from_table("missing"),
        ..Default::default()
    });
    let err = session.execute(&[Statement::Select(query)]).unwrap_err();
    assert_eq!(err.to_string(), "[L:- C:-] file missing does not exist");
}

#[test]
fn test_case_expression() {
    let (_dir, mut session) = setup();
    let query = SelectQuery::entity(SelectEntity {
        fields: vec![Field::new(Expression::Case(Box::new(Case {
            operand: None,
            when: vec![WhenClause {
                condition: Expression::comparison(
                    Expression::field("column1"),
                    ComparisonOp::Equal,
                    Expression::integer(2),
                ),
                result: Expression::string("two"),
            }],
            else_result: Some(Expression::string("other")),
        })))],
        from: from_table("table1"),
        ..Default::default()
    });
    let view = run_select(&mut session, query);
    assert_eq!(
        rows(&view),
        vec![
            vec!["other".to_string()],
            vec!["two".to_string()],
            vec!["other".to_string()],
        ]
    );
}

#[test]
fn test_scalar_subquery_and_exists() {
    let (_dir, mut session) = setup();
    // SELECT column2 FROM table1 WHERE EXISTS (SELECT 1 FROM table1 t WHERE t.column1 = table1.column1 AND t.column1 < 2)
    let inner = SelectQuery::entity(SelectEntity {
        fields: vec![Field::new(Expression::integer(1))],
        from: Some(FromClause {
            tables: vec![Table::aliased("table1", "t")],
        }),
        where_clause: Some(Expression::and(
            Expression::comparison(
                Expression::qualified_field("t", "column1"),
                ComparisonOp::Equal,
                Expression::qualified_field("table1", "column1"),
            ),
            Expression::comparison(
                Expression::qualified_field("t", "column1"),
                ComparisonOp::Less,
                Expression::integer(2),
            ),
        )),
        ..Default::default()
    });
    let query = SelectQuery::entity(SelectEntity {
        fields: vec![Field::new(Expression::field("column2"))],
        from: from_table("table1"),
        where_clause: Some(Expression::Exists(Box::new(Exists {
            query: inner,
            negated: false,
        }))),
        ..Default::default()
    });
    let view = run_select(&mut session, query);
    assert_eq!(rows(&view), vec![vec!["str1".to_string()]]);
}

#[test]
fn test_in_subquery() {
    let (dir, mut session) = setup();
    fs::write(dir.path().join("keys.csv"), "k\n1\n3\n").expect("failed to write fixture");
    let inner = SelectQuery::entity(SelectEntity {
        fields: vec![Field::new(Expression::field("k"))],
        from: from_table("keys"),
        ..Default::default()
    });
    let query = SelectQuery::entity(SelectEntity {
        fields: vec![Field::new(Expression::field("column2"))],
        from: from_table("table1"),
        where_clause: Some(Expression::In(Box::new(In {
            expr: Expression::field("column1"),
            source: InSource::Subquery(inner),
            negated: false,
        }))),
        ..Default::default()
    });
    let view = run_select(&mut session, query);
    assert_eq!(
        rows(&view),
        vec![vec!["str1".to_string()], vec!["str3".to_string()]]
    );
}

#[test]
fn test_json_row_table_function() {
    let (_dir, mut session) = setup();
    let call = FunctionCall::new(
        "json_row",
        vec![Expression::string(
            r#"[{"a": 1, "b": "x"}, {"a": 2, "b": "y"}]"#,
        )],
    );
    let query = SelectQuery::entity(SelectEntity {
        fields: vec![Field::new(Expression::all_columns())],
        from: Some(FromClause {
            tables: vec![Table {
                object: TableObject::Function(call),
                alias: Some(Identifier::new("j")),
            }],
        }),
        ..Default::default()
    });
    let view = run_select(&mut session, query);
    assert_eq!(view.header.get(0).column, "a");
    assert_eq!(view.header.get(0).view, "j");
    assert_eq!(
        rows(&view),
        vec![
            vec!["1".to_string(), "x".to_string()],
            vec!["2".to_string(), "y".to_string()],
        ]
    );
}

#[test]
fn test_variable_in_query() {
    let (_dir, mut session) = setup();
    let statements = vec![
        Statement::DeclareVariable(vec![VariableAssignment {
            variable: Variable::new("@min"),
            value: Some(Expression::integer(2)),
        }]),
        Statement::Select(SelectQuery::entity(SelectEntity {
            fields: vec![Field::new(Expression::field("column1"))],
            from: from_table("table1"),
            where_clause: Some(Expression::comparison(
                Expression::field("column1"),
                ComparisonOp::GreaterOrEqual,
                Expression::variable("@min"),
            )),
            ..Default::default()
        })),
    ];
    session.execute(&statements).expect("script failed");
    assert_eq!(session.result_views()[0].records.len(), 2);
    assert_eq!(
        session.result_views()[0].records[0].get(0),
        &Value::string("2")
    );
}

#[test]
fn test_undefined_variable_error() {
    let (_dir, mut session) = setup();
    let query = SelectQuery::entity(SelectEntity {
        fields: vec![Field::new(Expression::variable("@nope"))],
        ..Default::default()
    });
    let err = session.execute(&[Statement::Select(query)]).unwrap_err();
    assert_eq!(err.to_string(), "[L:- C:-] variable @nope is undefined");
}
