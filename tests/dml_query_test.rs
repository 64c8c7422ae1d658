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

//! DML tests: INSERT, UPDATE, DELETE against file-backed tables, log
//! lines, read-your-writes through the view cache, and commit contents

use std::fs;
use std::path::Path;

use csvql::ast::*;
use csvql::executor::Session;
use tempfile::TempDir;

const FIXTURE: &str = "column1,column2\n1,str1\n2,str2\n3,str3\n";

fn setup(name: &str) -> (TempDir, Session) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    fs::write(dir.path().join(name), FIXTURE).expect("failed to write fixture");
    let session = Session::with_dir(dir.path());
    (dir, session)
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).expect("failed to read file")
}

fn select_star(table: &str) -> Statement {
    Statement::Select(SelectQuery::entity(SelectEntity {
        fields: vec![Field::new(Expression::all_columns())],
        from: Some(FromClause {
            tables: vec![Table::named(table)],
        }),
        ..Default::default()
    }))
}

#[test]
fn test_insert_values_rewrites_file() {
    let (dir, mut session) = setup("insert_query.csv");
    let stmt = InsertStatement {
        table: Identifier::new("insert_query"),
        fields: vec![],
        source: InsertSource::Values(vec![
            vec![Expression::integer(4), Expression::string("str4")],
            vec![Expression::integer(5), Expression::string("str5")],
        ]),
    };
    let path = dir.path().join("insert_query.csv");
    let log = session.execute(&[Statement::Insert(stmt)]).expect("insert failed");
    assert_eq!(
        log,
        format!(
            "2 records inserted on \"{}\".\nCommit: file \"{}\" is updated.\n",
            path.display(),
            path.display()
        )
    );
    assert_eq!(
        read(dir.path(), "insert_query.csv"),
        "\"column1\",\"column2\"\n\"1\",\"str1\"\n\"2\",\"str2\"\n\"3\",\"str3\"\n4,\"str4\"\n5,\"str5\"\n"
    );
}

#[test]
fn test_insert_then_select_reads_back_tail() {
    let (_dir, mut session) = setup("t.csv");
    let insert = InsertStatement {
        table: Identifier::new("t"),
        fields: vec![],
        source: InsertSource::Values(vec![vec![
            Expression::integer(4),
            Expression::string("str4"),
        ]]),
    };
    session
        .execute(&[Statement::Insert(insert), select_star("t")])
        .expect("script failed");
    let view = &session.result_views()[0];
    assert_eq!(view.records.len(), 4);
    let tail: Vec<String> = view.records[3]
        .values()
        .iter()
        .map(|v| v.to_string())
        .collect();
    assert_eq!(tail, vec!["4", "str4"]);
}

#[test]
fn test_insert_with_field_list_defaults_to_null() {
    let (_dir, mut session) = setup("t.csv");
    let insert = InsertStatement {
        table: Identifier::new("t"),
        fields: vec![FieldReference::new("column2")],
        source: InsertSource::Values(vec![vec![Expression::string("only2")]]),
    };
    session
        .execute(&[Statement::Insert(insert), select_star("t")])
        .expect("script failed");
    let view = &session.result_views()[0];
    assert!(view.records[3].get(0).is_null());
    assert_eq!(view.records[3].get(1).to_string(), "only2");
}

#[test]
fn test_insert_row_width_mismatch() {
    let (_dir, mut session) = setup("t.csv");
    let insert = InsertStatement {
        table: Identifier::new("t"),
        fields: vec![FieldReference::new("column1")],
        source: InsertSource::Values(vec![vec![
            Expression::integer(1),
            Expression::integer(2),
        ]]),
    };
    let err = session.execute(&[Statement::Insert(insert)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "[L:- C:-] row value should contain exactly 1 field(s)"
    );
}

#[test]
fn test_insert_select_width_mismatch() {
    let (_dir, mut session) = setup("t.csv");
    let source = SelectQuery::entity(SelectEntity {
        fields: vec![Field::new(Expression::integer(1))],
        ..Default::default()
    });
    let insert = InsertStatement {
        table: Identifier::new("t"),
        fields: vec![
            FieldReference::new("column1"),
            FieldReference::new("column2"),
        ],
        source: InsertSource::Select(source),
    };
    let err = session.execute(&[Statement::Insert(insert)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "[L:- C:-] select query should return exactly 2 field(s)"
    );
}

#[test]
fn test_insert_into_missing_file() {
    let (_dir, mut session) = setup("t.csv");
    let insert = InsertStatement {
        table: Identifier::new("missing"),
        fields: vec![],
        source: InsertSource::Values(vec![vec![Expression::integer(1)]]),
    };
    let err = session.execute(&[Statement::Insert(insert)]).unwrap_err();
    assert_eq!(err.to_string(), "[L:- C:-] file missing does not exist");
}

#[test]
fn test_update_single_row() {
    let (dir, mut session) = setup("update_query.csv");
    let stmt = UpdateStatement {
        tables: vec![Table::named("update_query")],
        set: vec![SetEntry {
            field: FieldReference::new("column2"),
            value: Expression::string("update"),
        }],
        from: None,
        where_clause: Some(Expression::comparison(
            Expression::field("column1"),
            ComparisonOp::Equal,
            Expression::integer(2),
        )),
    };
    let path = dir.path().join("update_query.csv");
    let log = session.execute(&[Statement::Update(stmt)]).expect("update failed");
    assert_eq!(
        log,
        format!(
            "1 record updated on \"{}\".\nCommit: file \"{}\" is updated.\n",
            path.display(),
            path.display()
        )
    );
    assert_eq!(
        read(dir.path(), "update_query.csv"),
        "\"column1\",\"column2\"\n\"1\",\"str1\"\n\"2\",\"update\"\n\"3\",\"str3\"\n"
    );
}

#[test]
fn test_update_no_record_no_commit() {
    let (dir, mut session) = setup("update_query.csv");
    let stmt = UpdateStatement {
        tables: vec![Table::named("update_query")],
        set: vec![SetEntry {
            field: FieldReference::new("column2"),
            value: Expression::string("update"),
        }],
        from: None,
        where_clause: Some(Expression::literal(csvql::Value::Boolean(false))),
    };
    let path = dir.path().join("update_query.csv");
    let log = session.execute(&[Statement::Update(stmt)]).expect("update failed");
    assert_eq!(log, format!("no record updated on \"{}\".\n", path.display()));
    // File untouched
    assert_eq!(read(dir.path(), "update_query.csv"), FIXTURE);
}

#[test]
fn test_update_with_join_from_clause() {
    let (dir, mut session) = setup("orders.csv");
    fs::write(dir.path().join("status.csv"), "code,label\n2,shipped\n").expect("write failed");
    // UPDATE orders SET column2 = label FROM orders JOIN status ON column1 = code
    let join = Join {
        left: Table::named("orders"),
        right: Table::named("status"),
        kind: JoinKind::Inner,
        natural: false,
        condition: Some(JoinCondition::On(Expression::comparison(
            Expression::field("column1"),
            ComparisonOp::Equal,
            Expression::field("code"),
        ))),
    };
    let stmt = UpdateStatement {
        tables: vec![Table::named("orders")],
        set: vec![SetEntry {
            field: FieldReference::new("column2"),
            value: Expression::field("label"),
        }],
        from: Some(FromClause {
            tables: vec![Table {
                object: TableObject::Join(Box::new(join)),
                alias: None,
            }],
        }),
        where_clause: None,
    };
    session.execute(&[Statement::Update(stmt)]).expect("update failed");
    assert_eq!(
        read(dir.path(), "orders.csv"),
        "\"column1\",\"column2\"\n\"1\",\"str1\"\n\"2\",\"shipped\"\n\"3\",\"str3\"\n"
    );
}

#[test]
fn test_update_ambiguous_value_errors() {
    let (dir, mut session) = setup("target.csv");
    // Two status rows join to the same target row with different values
    fs::write(
        dir.path().join("status.csv"),
        "code,label\n2,first\n2,second\n",
    )
    .expect("write failed");
    let join = Join {
        left: Table::named("target"),
        right: Table::named("status"),
        kind: JoinKind::Inner,
        natural: false,
        condition: Some(JoinCondition::On(Expression::comparison(
            Expression::field("column1"),
            ComparisonOp::Equal,
            Expression::field("code"),
        ))),
    };
    let stmt = UpdateStatement {
        tables: vec![Table::named("target")],
        set: vec![SetEntry {
            field: FieldReference::new("column2"),
            value: Expression::field("label"),
        }],
        from: Some(FromClause {
            tables: vec![Table {
                object: TableObject::Join(Box::new(join)),
                alias: None,
            }],
        }),
        where_clause: None,
    };
    let err = session.execute(&[Statement::Update(stmt)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "[L:- C:-] value 'second' to set in the field column2 is ambiguous"
    );
    // Rollback: the file is untouched
    assert_eq!(read(dir.path(), "target.csv"), FIXTURE);
}

#[test]
fn test_update_field_outside_targets() {
    let (dir, mut session) = setup("a.csv");
    fs::write(dir.path().join("b.csv"), "column3,column4\n1,x\n").expect("write failed");
    let stmt = UpdateStatement {
        tables: vec![Table::named("a")],
        set: vec![SetEntry {
            field: FieldReference::new("column3"),
            value: Expression::string("nope"),
        }],
        from: Some(FromClause {
            tables: vec![Table::named("a"), Table::named("b")],
        }),
        where_clause: None,
    };
    let err = session.execute(&[Statement::Update(stmt)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "[L:- C:-] field column3 does not exist in the tables to update"
    );
}

#[test]
fn test_delete_single_row() {
    let (dir, mut session) = setup("delete_query.csv");
    let stmt = DeleteStatement {
        tables: vec![],
        from: FromClause {
            tables: vec![Table::named("delete_query")],
        },
        where_clause: Some(Expression::comparison(
            Expression::field("column1"),
            ComparisonOp::Equal,
            Expression::integer(2),
        )),
    };
    let path = dir.path().join("delete_query.csv");
    let log = session.execute(&[Statement::Delete(stmt)]).expect("delete failed");
    assert_eq!(
        log,
        format!(
            "1 record deleted on \"{}\".\nCommit: file \"{}\" is updated.\n",
            path.display(),
            path.display()
        )
    );
    assert_eq!(
        read(dir.path(), "delete_query.csv"),
        "\"column1\",\"column2\"\n\"1\",\"str1\"\n\"3\",\"str3\"\n"
    );
}

#[test]
fn test_delete_no_record() {
    let (dir, mut session) = setup("delete_query.csv");
    let stmt = DeleteStatement {
        tables: vec![],
        from: FromClause {
            tables: vec![Table::named("delete_query")],
        },
        where_clause: Some(Expression::literal(csvql::Value::Boolean(false))),
    };
    let path = dir.path().join("delete_query.csv");
    let log = session.execute(&[Statement::Delete(stmt)]).expect("delete failed");
    assert_eq!(log, format!("no record deleted on \"{}\".\n", path.display()));
}

#[test]
fn test_delete_requires_targets_with_joined_from() {
    let (dir, mut session) = setup("a.csv");
    fs::write(dir.path().join("b.csv"), "column3,column4\n1,x\n").expect("write failed");
    let stmt = DeleteStatement {
        tables: vec![],
        from: FromClause {
            tables: vec![Table::named("a"), Table::named("b")],
        },
        where_clause: None,
    };
    let err = session.execute(&[Statement::Delete(stmt)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "[L:- C:-] tables to delete records are not specified"
    );
}

#[test]
fn test_delete_from_join_with_target() {
    let (dir, mut session) = setup("a.csv");
    fs::write(dir.path().join("b.csv"), "code\n2\n3\n").expect("write failed");
    let stmt = DeleteStatement {
        tables: vec![Identifier::new("a")],
        from: FromClause {
            tables: vec![Table::named("a"), Table::named("b")],
        },
        where_clause: Some(Expression::comparison(
            Expression::field("column1"),
            ComparisonOp::Equal,
            Expression::field("code"),
        )),
    };
    session.execute(&[Statement::Delete(stmt)]).expect("delete failed");
    assert_eq!(
        read(dir.path(), "a.csv"),
        "\"column1\",\"column2\"\n\"1\",\"str1\"\n"
    );
}

#[test]
fn test_error_rolls_back_earlier_statements() {
    let (dir, mut session) = setup("t.csv");
    let insert = InsertStatement {
        table: Identifier::new("t"),
        fields: vec![],
        source: InsertSource::Values(vec![vec![
            Expression::integer(9),
            Expression::string("str9"),
        ]]),
    };
    let bad = SelectQuery::entity(SelectEntity {
        fields: vec![Field::new(Expression::field("notexist"))],
        from: Some(FromClause {
            tables: vec![Table::named("t")],
        }),
        ..Default::default()
    });
    let err = session
        .execute(&[Statement::Insert(insert), Statement::Select(bad)])
        .unwrap_err();
    assert_eq!(err.to_string(), "[L:- C:-] field notexist does not exist");
    // The insert never reached the file
    assert_eq!(read(dir.path(), "t.csv"), FIXTURE);
}
