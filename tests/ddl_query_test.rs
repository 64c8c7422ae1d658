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

//! DDL tests: CREATE TABLE and ALTER TABLE column operations

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

#[test]
fn test_create_table_writes_header_only() {
    let (dir, mut session) = setup("existing.csv");
    let stmt = CreateTableStatement {
        table: Identifier::new("create_table.csv"),
        fields: vec![Identifier::new("column1"), Identifier::new("column2")],
    };
    let path = dir.path().join("create_table.csv");
    let log = session
        .execute(&[Statement::CreateTable(stmt)])
        .expect("create failed");
    assert_eq!(
        log,
        format!(
            "file \"{}\" is created.\nCommit: file \"{}\" is created.\n",
            path.display(),
            path.display()
        )
    );
    assert_eq!(read(dir.path(), "create_table.csv"), "\"column1\",\"column2\"\n");
}

#[test]
fn test_create_table_then_select_is_empty() {
    let (_dir, mut session) = setup("existing.csv");
    let create = CreateTableStatement {
        table: Identifier::new("fresh.csv"),
        fields: vec![Identifier::new("a"), Identifier::new("b")],
    };
    let select = SelectQuery::entity(SelectEntity {
        fields: vec![Field::new(Expression::all_columns())],
        from: Some(FromClause {
            tables: vec![Table::named("fresh")],
        }),
        ..Default::default()
    });
    session
        .execute(&[Statement::CreateTable(create), Statement::Select(select)])
        .expect("script failed");
    let view = &session.result_views()[0];
    assert_eq!(view.records.len(), 0);
    assert_eq!(view.header.get(0).column, "a");
    assert_eq!(view.header.get(1).column, "b");
}

#[test]
fn test_create_existing_file_fails() {
    let (_dir, mut session) = setup("existing.csv");
    let stmt = CreateTableStatement {
        table: Identifier::new("existing.csv"),
        fields: vec![Identifier::new("column1")],
    };
    let err = session.execute(&[Statement::CreateTable(stmt)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "[L:- C:-] file existing.csv already exists"
    );
}

#[test]
fn test_create_duplicate_column_fails() {
    let (_dir, mut session) = setup("existing.csv");
    let stmt = CreateTableStatement {
        table: Identifier::new("dup.csv"),
        fields: vec![Identifier::new("col1"), Identifier::new("COL1")],
    };
    let err = session.execute(&[Statement::CreateTable(stmt)]).unwrap_err();
    assert_eq!(err.to_string(), "[L:- C:-] field name COL1 is a duplicate");
}

#[test]
fn test_add_column_with_null_fill() {
    let (dir, mut session) = setup("add_columns.csv");
    let stmt = AddColumnsStatement {
        table: Identifier::new("add_columns"),
        columns: vec![ColumnDefault {
            column: Identifier::new("column3"),
            default: None,
        }],
        placement: None,
    };
    let path = dir.path().join("add_columns.csv");
    let log = session
        .execute(&[Statement::AddColumns(stmt)])
        .expect("alter failed");
    assert_eq!(
        log,
        format!(
            "1 field added on \"{}\".\nCommit: file \"{}\" is updated.\n",
            path.display(),
            path.display()
        )
    );
    assert_eq!(
        read(dir.path(), "add_columns.csv"),
        "\"column1\",\"column2\",\"column3\"\n\"1\",\"str1\",\n\"2\",\"str2\",\n\"3\",\"str3\",\n"
    );
}

#[test]
fn test_add_column_default_sees_row_fields() {
    let (dir, mut session) = setup("t.csv");
    let stmt = AddColumnsStatement {
        table: Identifier::new("t"),
        columns: vec![ColumnDefault {
            column: Identifier::new("doubled"),
            default: Some(Expression::arithmetic(
                Expression::field("column1"),
                ArithmeticOp::Multiply,
                Expression::integer(2),
            )),
        }],
        placement: None,
    };
    session
        .execute(&[Statement::AddColumns(stmt)])
        .expect("alter failed");
    assert_eq!(
        read(dir.path(), "t.csv"),
        "\"column1\",\"column2\",\"doubled\"\n\"1\",\"str1\",2\n\"2\",\"str2\",4\n\"3\",\"str3\",6\n"
    );
}

#[test]
fn test_add_column_placement_first_and_after() {
    let (dir, mut session) = setup("t.csv");
    let first = AddColumnsStatement {
        table: Identifier::new("t"),
        columns: vec![ColumnDefault {
            column: Identifier::new("id"),
            default: Some(Expression::integer(0)),
        }],
        placement: Some(ColumnPlacement::First),
    };
    let after = AddColumnsStatement {
        table: Identifier::new("t"),
        columns: vec![ColumnDefault {
            column: Identifier::new("mid"),
            default: None,
        }],
        placement: Some(ColumnPlacement::After(FieldReference::new("column1"))),
    };
    session
        .execute(&[Statement::AddColumns(first), Statement::AddColumns(after)])
        .expect("alter failed");
    assert_eq!(
        read(dir.path(), "t.csv"),
        "\"id\",\"column1\",\"mid\",\"column2\"\n0,\"1\",,\"str1\"\n0,\"2\",,\"str2\"\n0,\"3\",,\"str3\"\n"
    );
}

#[test]
fn test_add_duplicate_column_fails() {
    let (_dir, mut session) = setup("t.csv");
    let stmt = AddColumnsStatement {
        table: Identifier::new("t"),
        columns: vec![ColumnDefault {
            column: Identifier::new("COLUMN1"),
            default: None,
        }],
        placement: None,
    };
    let err = session.execute(&[Statement::AddColumns(stmt)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "[L:- C:-] field name COLUMN1 is a duplicate"
    );
}

#[test]
fn test_drop_column() {
    let (dir, mut session) = setup("drop_columns.csv");
    let stmt = DropColumnsStatement {
        table: Identifier::new("drop_columns"),
        columns: vec![FieldReference::new("column1")],
    };
    let path = dir.path().join("drop_columns.csv");
    let log = session
        .execute(&[Statement::DropColumns(stmt)])
        .expect("alter failed");
    assert_eq!(
        log,
        format!(
            "1 field dropped on \"{}\".\nCommit: file \"{}\" is updated.\n",
            path.display(),
            path.display()
        )
    );
    assert_eq!(
        read(dir.path(), "drop_columns.csv"),
        "\"column2\"\n\"str1\"\n\"str2\"\n\"str3\"\n"
    );
}

#[test]
fn test_drop_missing_column_fails() {
    let (_dir, mut session) = setup("t.csv");
    let stmt = DropColumnsStatement {
        table: Identifier::new("t"),
        columns: vec![FieldReference::new("ghost")],
    };
    let err = session.execute(&[Statement::DropColumns(stmt)]).unwrap_err();
    assert_eq!(err.to_string(), "[L:- C:-] field ghost does not exist");
}

#[test]
fn test_rename_column() {
    let (dir, mut session) = setup("rename_column.csv");
    let stmt = RenameColumnStatement {
        table: Identifier::new("rename_column"),
        old: FieldReference::new("column1"),
        new: Identifier::new("newcolumn"),
    };
    let path = dir.path().join("rename_column.csv");
    let log = session
        .execute(&[Statement::RenameColumn(stmt)])
        .expect("alter failed");
    assert_eq!(
        log,
        format!(
            "1 field renamed on \"{}\".\nCommit: file \"{}\" is updated.\n",
            path.display(),
            path.display()
        )
    );
    assert_eq!(
        read(dir.path(), "rename_column.csv"),
        "\"newcolumn\",\"column2\"\n\"1\",\"str1\"\n\"2\",\"str2\"\n\"3\",\"str3\"\n"
    );
}

#[test]
fn test_rename_to_existing_name_fails() {
    let (_dir, mut session) = setup("t.csv");
    let stmt = RenameColumnStatement {
        table: Identifier::new("t"),
        old: FieldReference::new("column1"),
        new: Identifier::new("column2"),
    };
    let err = session
        .execute(&[Statement::RenameColumn(stmt)])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "[L:- C:-] field name column2 is a duplicate"
    );
}

#[test]
fn test_ddl_on_temporary_table_mutates_in_place() {
    let (_dir, mut session) = setup("t.csv");
    let statements = vec![
        Statement::DeclareTable(TableDeclaration {
            table: Identifier::new("tbl"),
            fields: vec![Identifier::new("c1")],
            query: None,
        }),
        Statement::AddColumns(AddColumnsStatement {
            table: Identifier::new("tbl"),
            columns: vec![ColumnDefault {
                column: Identifier::new("c2"),
                default: None,
            }],
            placement: None,
        }),
        Statement::Select(SelectQuery::entity(SelectEntity {
            fields: vec![Field::new(Expression::all_columns())],
            from: Some(FromClause {
                tables: vec![Table::named("tbl")],
            }),
            ..Default::default()
        })),
    ];
    let log = session.execute(&statements).expect("script failed");
    assert_eq!(log, "1 field added on \"tbl\".\n");
    let view = &session.result_views()[0];
    assert_eq!(view.header.len(), 2);
}
