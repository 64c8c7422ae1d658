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

//! AST node definitions
//!
//! The parser front end produces these nodes; the executor consumes them.
//! Nodes carry the source [`Position`] the parser saw so that errors can be
//! anchored; programmatically built nodes leave it `None` and render as
//! `[L:- C:-]`.

use std::fmt;

use crate::core::{Position, Value};

/// A bare identifier with its source position
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Identifier {
    pub literal: String,
    pub position: Option<Position>,
}

impl Identifier {
    pub fn new(literal: impl Into<String>) -> Self {
        Identifier {
            literal: literal.into(),
            position: None,
        }
    }

    pub fn at(literal: impl Into<String>, position: Position) -> Self {
        Identifier {
            literal: literal.into(),
            position: Some(position),
        }
    }

    /// Uppercased form used as the lookup key everywhere
    pub fn uname(&self) -> String {
        self.literal.to_uppercase()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.literal)
    }
}

/// A procedural variable reference (`@name`)
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub position: Option<Position>,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Variable {
            name: name.into(),
            position: None,
        }
    }

    pub fn uname(&self) -> String {
        self.name.to_uppercase()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A column reference, optionally qualified by a view name
#[derive(Debug, Clone, PartialEq)]
pub struct FieldReference {
    pub view: Option<Identifier>,
    pub column: Identifier,
}

impl FieldReference {
    pub fn new(column: impl Into<String>) -> Self {
        FieldReference {
            view: None,
            column: Identifier::new(column),
        }
    }

    pub fn qualified(view: impl Into<String>, column: impl Into<String>) -> Self {
        FieldReference {
            view: Some(Identifier::new(view)),
            column: Identifier::new(column),
        }
    }

    pub fn position(&self) -> Option<Position> {
        self.column.position
    }
}

impl fmt::Display for FieldReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.view {
            Some(view) => write!(f, "{}.{}", view, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

/// A 1-based positional column reference (`table.2`)
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnNumber {
    pub view: Identifier,
    pub number: i64,
    pub position: Option<Position>,
}

impl fmt::Display for ColumnNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.view, self.number)
    }
}

// =============================================================================
// Expressions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
            ArithmeticOp::Modulo => "%",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "<>",
            ComparisonOp::Less => "<",
            ComparisonOp::LessOrEqual => "<=",
            ComparisonOp::Greater => ">",
            ComparisonOp::GreaterOrEqual => ">=",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Any,
    All,
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantifier::Any => write!(f, "ANY"),
            Quantifier::All => write!(f, "ALL"),
        }
    }
}

/// A literal scalar
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: Value,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arithmetic {
    pub lhs: Expression,
    pub operator: ArithmeticOp,
    pub rhs: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryMinus {
    pub operand: Expression,
    pub position: Option<Position>,
}

/// String concatenation (`||` chain)
#[derive(Debug, Clone, PartialEq)]
pub struct Concat {
    pub items: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub lhs: Expression,
    pub operator: ComparisonOp,
    pub rhs: Expression,
}

/// `expr IS [NOT] NULL` / `expr IS [NOT] TRUE|FALSE|UNKNOWN`
#[derive(Debug, Clone, PartialEq)]
pub struct Is {
    pub lhs: Expression,
    pub rhs: Expression,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Between {
    pub expr: Expression,
    pub low: Expression,
    pub high: Expression,
    pub negated: bool,
}

/// The right-hand side of an IN predicate
#[derive(Debug, Clone, PartialEq)]
pub enum InSource {
    List(Vec<Expression>),
    Subquery(SelectQuery),
}

#[derive(Debug, Clone, PartialEq)]
pub struct In {
    pub expr: Expression,
    pub source: InSource,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Like {
    pub expr: Expression,
    pub pattern: Expression,
    pub negated: bool,
}

/// `expr op ANY (query)` / `expr op ALL (query)`
#[derive(Debug, Clone, PartialEq)]
pub struct AnyAll {
    pub expr: Expression,
    pub operator: ComparisonOp,
    pub quantifier: Quantifier,
    pub query: SelectQuery,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exists {
    pub query: SelectQuery,
    pub negated: bool,
}

/// AND / OR / NOT; NOT leaves `lhs` empty
#[derive(Debug, Clone, PartialEq)]
pub struct Logic {
    pub lhs: Option<Expression>,
    pub operator: LogicOp,
    pub rhs: Expression,
}

/// A function call: scalar, aggregate or user-defined
///
/// `star` marks `count(*)`; `distinct` marks `f(DISTINCT expr)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: Identifier,
    pub args: Vec<Expression>,
    pub distinct: bool,
    pub star: bool,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Vec<Expression>) -> Self {
        FunctionCall {
            name: Identifier::new(name),
            args,
            distinct: false,
            star: false,
        }
    }

    /// `count(*)`
    pub fn count_star() -> Self {
        FunctionCall {
            name: Identifier::new("count"),
            args: Vec::new(),
            distinct: false,
            star: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhenClause {
    pub condition: Expression,
    pub result: Expression,
}

/// CASE expression, both searched and operand forms
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub operand: Option<Expression>,
    pub when: Vec<WhenClause>,
    pub else_result: Option<Expression>,
}

/// An expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    FieldReference(FieldReference),
    ColumnNumber(ColumnNumber),
    /// `*` or `view.*`, valid only in a select field list
    AllColumns {
        view: Option<Identifier>,
        position: Option<Position>,
    },
    Variable(Variable),
    Arithmetic(Box<Arithmetic>),
    UnaryMinus(Box<UnaryMinus>),
    Concat(Concat),
    Comparison(Box<Comparison>),
    Is(Box<Is>),
    Between(Box<Between>),
    In(Box<In>),
    Like(Box<Like>),
    AnyAll(Box<AnyAll>),
    Exists(Box<Exists>),
    Logic(Box<Logic>),
    Function(FunctionCall),
    Case(Box<Case>),
    /// Scalar subquery
    Subquery(Box<SelectQuery>),
}

impl Expression {
    pub fn literal(value: Value) -> Self {
        Expression::Literal(Literal {
            value,
            position: None,
        })
    }

    pub fn integer(value: i64) -> Self {
        Self::literal(Value::Integer(value))
    }

    pub fn float(value: f64) -> Self {
        Self::literal(Value::Float(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::literal(Value::string(value))
    }

    pub fn null() -> Self {
        Self::literal(Value::Null)
    }

    pub fn field(column: impl Into<String>) -> Self {
        Expression::FieldReference(FieldReference::new(column))
    }

    /// `*`
    pub fn all_columns() -> Self {
        Expression::AllColumns {
            view: None,
            position: None,
        }
    }

    /// `view.*`
    pub fn table_columns(view: impl Into<String>) -> Self {
        Expression::AllColumns {
            view: Some(Identifier::new(view)),
            position: None,
        }
    }

    pub fn qualified_field(view: impl Into<String>, column: impl Into<String>) -> Self {
        Expression::FieldReference(FieldReference::qualified(view, column))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable(Variable::new(name))
    }

    pub fn comparison(lhs: Expression, operator: ComparisonOp, rhs: Expression) -> Self {
        Expression::Comparison(Box::new(Comparison { lhs, operator, rhs }))
    }

    pub fn arithmetic(lhs: Expression, operator: ArithmeticOp, rhs: Expression) -> Self {
        Expression::Arithmetic(Box::new(Arithmetic { lhs, operator, rhs }))
    }

    pub fn and(lhs: Expression, rhs: Expression) -> Self {
        Expression::Logic(Box::new(Logic {
            lhs: Some(lhs),
            operator: LogicOp::And,
            rhs,
        }))
    }

    pub fn or(lhs: Expression, rhs: Expression) -> Self {
        Expression::Logic(Box::new(Logic {
            lhs: Some(lhs),
            operator: LogicOp::Or,
            rhs,
        }))
    }

    pub fn not(rhs: Expression) -> Self {
        Expression::Logic(Box::new(Logic {
            lhs: None,
            operator: LogicOp::Not,
            rhs,
        }))
    }

    pub fn function(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Function(FunctionCall::new(name, args))
    }

    /// The source position for error anchoring, when the parser recorded one
    pub fn position(&self) -> Option<Position> {
        match self {
            Expression::Literal(l) => l.position,
            Expression::FieldReference(f) => f.position(),
            Expression::ColumnNumber(c) => c.position,
            Expression::AllColumns { position, .. } => *position,
            Expression::Variable(v) => v.position,
            Expression::Arithmetic(a) => a.lhs.position(),
            Expression::UnaryMinus(u) => u.position,
            Expression::Concat(c) => c.items.first().and_then(|e| e.position()),
            Expression::Comparison(c) => c.lhs.position(),
            Expression::Is(i) => i.lhs.position(),
            Expression::Between(b) => b.expr.position(),
            Expression::In(i) => i.expr.position(),
            Expression::Like(l) => l.expr.position(),
            Expression::AnyAll(a) => a.expr.position(),
            Expression::Exists(e) => e.query.position,
            Expression::Logic(l) => l
                .lhs
                .as_ref()
                .and_then(|e| e.position())
                .or_else(|| l.rhs.position()),
            Expression::Function(f) => f.name.position,
            Expression::Case(c) => c
                .operand
                .as_ref()
                .and_then(|e| e.position())
                .or_else(|| c.when.first().and_then(|w| w.condition.position())),
            Expression::Subquery(q) => q.position,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(l) => write!(f, "{}", l.value),
            Expression::FieldReference(r) => write!(f, "{}", r),
            Expression::ColumnNumber(c) => write!(f, "{}", c),
            Expression::AllColumns { view, .. } => match view {
                Some(v) => write!(f, "{}.*", v),
                None => write!(f, "*"),
            },
            Expression::Variable(v) => write!(f, "{}", v),
            Expression::Arithmetic(a) => write!(f, "{} {} {}", a.lhs, a.operator, a.rhs),
            Expression::UnaryMinus(u) => write!(f, "-{}", u.operand),
            Expression::Concat(c) => {
                let parts: Vec<String> = c.items.iter().map(|e| e.to_string()).collect();
                write!(f, "{}", parts.join(" || "))
            }
            Expression::Comparison(c) => write!(f, "{} {} {}", c.lhs, c.operator, c.rhs),
            Expression::Is(i) => {
                if i.negated {
                    write!(f, "{} IS NOT {}", i.lhs, i.rhs)
                } else {
                    write!(f, "{} IS {}", i.lhs, i.rhs)
                }
            }
            Expression::Between(b) => {
                write!(f, "{} BETWEEN {} AND {}", b.expr, b.low, b.high)
            }
            Expression::In(i) => write!(f, "{} IN (...)", i.expr),
            Expression::Like(l) => write!(f, "{} LIKE {}", l.expr, l.pattern),
            Expression::AnyAll(a) => {
                write!(f, "{} {} {} (...)", a.expr, a.operator, a.quantifier)
            }
            Expression::Exists(_) => write!(f, "EXISTS (...)"),
            Expression::Logic(l) => match l.operator {
                LogicOp::And => write!(f, "{} AND {}", l.lhs.as_ref().unwrap(), l.rhs),
                LogicOp::Or => write!(f, "{} OR {}", l.lhs.as_ref().unwrap(), l.rhs),
                LogicOp::Not => write!(f, "NOT {}", l.rhs),
            },
            Expression::Function(c) => {
                if c.star {
                    return write!(f, "{}(*)", c.name);
                }
                let args: Vec<String> = c.args.iter().map(|a| a.to_string()).collect();
                if c.distinct {
                    write!(f, "{}(DISTINCT {})", c.name, args.join(", "))
                } else {
                    write!(f, "{}({})", c.name, args.join(", "))
                }
            }
            Expression::Case(_) => write!(f, "CASE"),
            Expression::Subquery(_) => write!(f, "(SELECT)"),
        }
    }
}

// =============================================================================
// Select queries
// =============================================================================

/// A projected field with an optional alias
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub expr: Expression,
    pub alias: Option<Identifier>,
}

impl Field {
    pub fn new(expr: Expression) -> Self {
        Field { expr, alias: None }
    }

    pub fn aliased(expr: Expression, alias: impl Into<String>) -> Self {
        Field {
            expr,
            alias: Some(Identifier::new(alias)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinCondition {
    On(Expression),
    Using(Vec<Identifier>),
}

/// A join between two table expressions
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub left: Table,
    pub right: Table,
    pub kind: JoinKind,
    pub natural: bool,
    pub condition: Option<JoinCondition>,
}

/// What a FROM item refers to
#[derive(Debug, Clone, PartialEq)]
pub enum TableObject {
    /// A file-backed table, temporary table or inline table, by name
    Identifier(Identifier),
    /// A derived table
    Subquery(SelectQuery),
    /// A relation-returning function call, e.g. `JSON_ROW(...)`
    Function(FunctionCall),
    Join(Box<Join>),
    /// The one-row pseudo table
    Dual,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub object: TableObject,
    pub alias: Option<Identifier>,
}

impl Table {
    pub fn named(name: impl Into<String>) -> Self {
        Table {
            object: TableObject::Identifier(Identifier::new(name)),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Table {
            object: TableObject::Identifier(Identifier::new(name)),
            alias: Some(Identifier::new(alias)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FromClause {
    pub tables: Vec<Table>,
}

/// An inline table in a WITH clause
#[derive(Debug, Clone, PartialEq)]
pub struct InlineTable {
    pub recursive: bool,
    pub name: Identifier,
    pub fields: Vec<Identifier>,
    pub query: SelectQuery,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WithClause {
    pub tables: Vec<InlineTable>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsPosition {
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub expr: Expression,
    pub direction: Option<SortDirection>,
    pub nulls: Option<NullsPosition>,
}

impl OrderItem {
    pub fn new(expr: Expression) -> Self {
        OrderItem {
            expr,
            direction: None,
            nulls: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderByClause {
    pub items: Vec<OrderItem>,
}

/// LIMIT, optionally as a percentage of the result
#[derive(Debug, Clone, PartialEq)]
pub struct LimitClause {
    pub value: Expression,
    pub percent: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OffsetClause {
    pub value: Expression,
}

/// One plain SELECT block: projection plus FROM/WHERE/GROUP BY/HAVING
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectEntity {
    pub distinct: bool,
    pub fields: Vec<Field>,
    pub from: Option<FromClause>,
    pub where_clause: Option<Expression>,
    pub group_by: Vec<Expression>,
    pub having: Option<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
}

/// A set operation over two select bodies
#[derive(Debug, Clone, PartialEq)]
pub struct SetOperation {
    pub left: Box<SelectBody>,
    pub operator: SetOperator,
    pub all: bool,
    pub right: Box<SelectBody>,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectBody {
    Entity(SelectEntity),
    Set(SetOperation),
}

impl Default for SelectBody {
    fn default() -> Self {
        SelectBody::Entity(SelectEntity::default())
    }
}

/// A complete select query
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectQuery {
    pub with: Option<WithClause>,
    pub body: SelectBody,
    pub order_by: Option<OrderByClause>,
    pub offset: Option<OffsetClause>,
    pub limit: Option<LimitClause>,
    pub position: Option<Position>,
}

impl SelectQuery {
    /// Convenience constructor for a plain projection query
    pub fn entity(entity: SelectEntity) -> Self {
        SelectQuery {
            body: SelectBody::Entity(entity),
            ..Default::default()
        }
    }
}

// =============================================================================
// Statements
// =============================================================================

/// The row source of an INSERT
#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    Values(Vec<Vec<Expression>>),
    Select(SelectQuery),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: Identifier,
    pub fields: Vec<FieldReference>,
    pub source: InsertSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetEntry {
    pub field: FieldReference,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub tables: Vec<Table>,
    pub set: Vec<SetEntry>,
    pub from: Option<FromClause>,
    pub where_clause: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    /// Explicit target tables; may be empty when FROM has exactly one table
    pub tables: Vec<Identifier>,
    pub from: FromClause,
    pub where_clause: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub table: Identifier,
    pub fields: Vec<Identifier>,
}

/// Placement of added columns
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnPlacement {
    First,
    Last,
    After(FieldReference),
    Before(FieldReference),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefault {
    pub column: Identifier,
    pub default: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddColumnsStatement {
    pub table: Identifier,
    pub columns: Vec<ColumnDefault>,
    pub placement: Option<ColumnPlacement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropColumnsStatement {
    pub table: Identifier,
    pub columns: Vec<FieldReference>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenameColumnStatement {
    pub table: Identifier,
    pub old: FieldReference,
    pub new: Identifier,
}

/// `VAR @x := expr` entries; value None declares the variable as NULL
#[derive(Debug, Clone, PartialEq)]
pub struct VariableAssignment {
    pub variable: Variable,
    pub value: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDeclaration {
    pub table: Identifier,
    pub fields: Vec<Identifier>,
    pub query: Option<SelectQuery>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CursorDeclaration {
    pub cursor: Identifier,
    pub query: SelectQuery,
}

/// A declared parameter, optionally with a default
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub variable: Variable,
    pub default: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: Identifier,
    pub parameters: Vec<Parameter>,
    pub body: Vec<Statement>,
}

/// A user-defined aggregate; the body reads the group through `cursor`
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateDeclaration {
    pub name: Identifier,
    pub cursor: Identifier,
    pub parameters: Vec<Parameter>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Next,
    Prior,
    First,
    Last,
    Absolute,
    Relative,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchPosition {
    pub kind: FetchKind,
    pub number: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchStatement {
    pub cursor: Identifier,
    pub position: Option<FetchPosition>,
    pub variables: Vec<Variable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElseIf {
    pub condition: Expression,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expression,
    pub statements: Vec<Statement>,
    pub else_ifs: Vec<ElseIf>,
    pub else_statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub condition: Expression,
    pub statements: Vec<Statement>,
}

/// `WHILE @a, @b IN cursor DO ... END WHILE`
#[derive(Debug, Clone, PartialEq)]
pub struct WhileInCursorStatement {
    pub variables: Vec<Variable>,
    pub cursor: Identifier,
    pub statements: Vec<Statement>,
}

/// A statement as produced by the parser
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectQuery),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    CreateTable(CreateTableStatement),
    AddColumns(AddColumnsStatement),
    DropColumns(DropColumnsStatement),
    RenameColumn(RenameColumnStatement),
    DeclareVariable(Vec<VariableAssignment>),
    SetVariable {
        variable: Variable,
        value: Expression,
    },
    DisposeVariable(Variable),
    DeclareTable(TableDeclaration),
    DeclareCursor(CursorDeclaration),
    OpenCursor(Identifier),
    CloseCursor(Identifier),
    DisposeCursor(Identifier),
    Fetch(FetchStatement),
    DeclareFunction(FunctionDeclaration),
    DeclareAggregate(AggregateDeclaration),
    If(IfStatement),
    While(WhileStatement),
    WhileInCursor(WhileInCursorStatement),
    Continue,
    Break,
    Return(Option<Expression>),
    Exit,
    Print(Expression),
    Commit,
    Rollback,
}
