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

//! Set operation tests: UNION/INTERSECT/EXCEPT, ALL variants, the width
//! law, and inline tables including recursion

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
    fs::write(
        dir.path().join("table4.csv"),
        "column3,column4\n2,str2\n3,str3\n4,str4\n",
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

fn table_body(table: &str, columns: &[&str]) -> SelectBody {
    SelectBody::Entity(SelectEntity {
        fields: columns
            .iter()
            .map(|c| Field::new(Expression::field(*c)))
            .collect(),
        from: Some(FromClause {
            tables: vec![Table::named(table)],
        }),
        ..Default::default()
    })
}

fn set_query(operator: SetOperator, all: bool) -> SelectQuery {
    SelectQuery {
        body: SelectBody::Set(SetOperation {
            left: Box::new(table_body("table1", &["column1", "column2"])),
            operator,
            all,
            right: Box::new(table_body("table4", &["column3", "column4"])),
            position: None,
        }),
        ..Default::default()
    }
}

#[test]
fn test_union_distinct() {
    let (_dir, mut session) = setup();
    let view = run_select(&mut session, set_query(SetOperator::Union, false));
    assert_eq!(
        rows(&view),
        vec![
            vec!["1".to_string(), "str1".to_string()],
            vec!["2".to_string(), "str2".to_string()],
            vec!["3".to_string(), "str3".to_string()],
            vec!["4".to_string(), "str4".to_string()],
        ]
    );
    // Header comes from the left side
    assert_eq!(view.header.get(0).column, "column1");
}

#[test]
fn test_union_all() {
    let (_dir, mut session) = setup();
    let view = run_select(&mut session, set_query(SetOperator::Union, true));
    assert_eq!(view.records.len(), 6);
}

#[test]
fn test_intersect() {
    let (_dir, mut session) = setup();
    let view = run_select(&mut session, set_query(SetOperator::Intersect, false));
    assert_eq!(
        rows(&view),
        vec![
            vec!["2".to_string(), "str2".to_string()],
            vec!["3".to_string(), "str3".to_string()],
        ]
    );
}

#[test]
fn test_except() {
    let (_dir, mut session) = setup();
    let view = run_select(&mut session, set_query(SetOperator::Except, false));
    assert_eq!(rows(&view), vec![vec!["1".to_string(), "str1".to_string()]]);
}

#[test]
fn test_width_mismatch_fails_before_execution() {
    let (_dir, mut session) = setup();
    let query = SelectQuery {
        body: SelectBody::Set(SetOperation {
            left: Box::new(table_body("table1", &["column1", "column2"])),
            operator: SetOperator::Union,
            all: false,
            right: Box::new(table_body("table4", &["column3"])),
            position: None,
        }),
        ..Default::default()
    };
    let err = session.execute(&[Statement::Select(query)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "[L:- C:-] result set to be combined should contain exactly 2 field(s)"
    );
}

#[test]
fn test_order_by_applies_to_combined_result() {
    let (_dir, mut session) = setup();
    let mut query = set_query(SetOperator::Union, false);
    query.order_by = Some(OrderByClause {
        items: vec![OrderItem {
            expr: Expression::field("column1"),
            direction: Some(SortDirection::Descending),
            nulls: None,
        }],
    });
    let view = run_select(&mut session, query);
    let first: Vec<String> = view.records[0]
        .values()
        .iter()
        .map(|v| v.to_string())
        .collect();
    assert_eq!(first, vec!["4", "str4"]);
}

// =============================================================================
// Inline tables
// =============================================================================

#[test]
fn test_inline_table_is_visible_to_body() {
    let (_dir, mut session) = setup();
    let inline = InlineTable {
        recursive: false,
        name: Identifier::new("small"),
        fields: vec![Identifier::new("n")],
        query: SelectQuery::entity(SelectEntity {
            fields: vec![Field::new(Expression::field("column1"))],
            from: Some(FromClause {
                tables: vec![Table::named("table1")],
            }),
            where_clause: Some(Expression::comparison(
                Expression::field("column1"),
                ComparisonOp::Less,
                Expression::integer(3),
            )),
            ..Default::default()
        }),
    };
    let query = SelectQuery {
        with: Some(WithClause {
            tables: vec![inline],
        }),
        body: SelectBody::Entity(SelectEntity {
            fields: vec![Field::new(Expression::field("n"))],
            from: Some(FromClause {
                tables: vec![Table::named("small")],
            }),
            ..Default::default()
        }),
        ..Default::default()
    };
    let view = run_select(&mut session, query);
    assert_eq!(
        rows(&view),
        vec![vec!["1".to_string()], vec!["2".to_string()]]
    );
}

#[test]
fn test_inline_table_scope_ends_with_query() {
    let (_dir, mut session) = setup();
    let inline = InlineTable {
        recursive: false,
        name: Identifier::new("tmp"),
        fields: vec![],
        query: SelectQuery::entity(SelectEntity {
            fields: vec![Field::new(Expression::integer(1))],
            ..Default::default()
        }),
    };
    let first = SelectQuery {
        with: Some(WithClause {
            tables: vec![inline],
        }),
        body: SelectBody::Entity(SelectEntity {
            fields: vec![Field::new(Expression::all_columns())],
            from: Some(FromClause {
                tables: vec![Table::named("tmp")],
            }),
            ..Default::default()
        }),
        ..Default::default()
    };
    session
        .execute(&[Statement::Select(first)])
        .expect("first query failed");

    // The inline table does not leak into the next statement
    let second = SelectQuery::entity(SelectEntity {
        fields: vec![Field::new(Expression::all_columns())],
        from: Some(FromClause {
            tables: vec![Table::named("tmp")],
        }),
        ..Default::default()
    });
    let err = session.execute(&[Statement::Select(second)]).unwrap_err();
    assert_eq!(err.to_string(), "[L:- C:-] file tmp does not exist");
}

/// WITH RECURSIVE it(n) AS (SELECT 1 UNION SELECT n+1 FROM it WHERE n < 3)
/// SELECT n FROM it
fn recursive_query(limit: i64) -> SelectQuery {
    let anchor = SelectBody::Entity(SelectEntity {
        fields: vec![Field::new(Expression::integer(1))],
        ..Default::default()
    });
    let term = SelectBody::Entity(SelectEntity {
        fields: vec![Field::new(Expression::arithmetic(
            Expression::field("n"),
            ArithmeticOp::Add,
            Expression::integer(1),
        ))],
        from: Some(FromClause {
            tables: vec![Table::named("it")],
        }),
        where_clause: Some(Expression::comparison(
            Expression::field("n"),
            ComparisonOp::Less,
            Expression::integer(limit),
        )),
        ..Default::default()
    });
    let inline = InlineTable {
        recursive: true,
        name: Identifier::new("it"),
        fields: vec![Identifier::new("n")],
        query: SelectQuery {
            body: SelectBody::Set(SetOperation {
                left: Box::new(anchor),
                operator: SetOperator::Union,
                all: false,
                right: Box::new(term),
                position: None,
            }),
            ..Default::default()
        },
    };
    SelectQuery {
        with: Some(WithClause {
            tables: vec![inline],
        }),
        body: SelectBody::Entity(SelectEntity {
            fields: vec![Field::new(Expression::field("n"))],
            from: Some(FromClause {
                tables: vec![Table::named("it")],
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[test]
fn test_recursive_inline_table_fixpoint() {
    let (_dir, mut session) = setup();
    let view = run_select(&mut session, recursive_query(3));
    assert_eq!(
        view.records
            .iter()
            .map(|r| r.get(0).clone())
            .collect::<Vec<_>>(),
        vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]
    );
}

#[test]
fn test_recursion_cap() {
    let (_dir, mut session) = setup();
    session.set_recursion_cap(10);
    let err = session
        .execute(&[Statement::Select(recursive_query(1_000_000))])
        .unwrap_err();
    assert_eq!(err.to_string(), "[L:- C:-] recursion exceeded the limit");
}
