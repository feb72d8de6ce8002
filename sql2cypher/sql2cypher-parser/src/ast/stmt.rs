use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

use super::expr::{ColumnRef, Cond, Expr};

/// A single SQL statement, reduced to what the translator understands.
#[derive(Debug, Clone, PartialEq, EnumAsInner, Serialize, Deserialize, strum::AsRefStr)]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    Truncate(Truncate),
    /// The input held nothing but whitespace and comments.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Select {
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub distinct: bool,
    pub projection: Vec<SelectItem>,
    /// Comma-separated FROM items.
    pub from: Vec<TableExpr>,
    pub selection: Option<Cond>,
    pub group_by: Vec<Expr>,
    pub having: Option<Cond>,
    pub order_by: Vec<OrderByItem>,
    /// `LIMIT n`, `TOP n` or `FETCH FIRST n ROWS`
    pub limit: Option<Expr>,
    pub offset: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, EnumAsInner, Serialize, Deserialize)]
pub enum SelectItem {
    Expr { expr: Expr, alias: Option<String> },
    Wildcard,
    QualifiedWildcard(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByItem {
    pub expr: Expr,
    pub direction: Option<SortDirection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum SortDirection {
    #[strum(to_string = "ASC")]
    Asc,
    #[strum(to_string = "DESC")]
    Desc,
}

#[derive(Debug, Clone, PartialEq, EnumAsInner, Serialize, Deserialize)]
pub enum TableExpr {
    Table(TableRef),
    Derived {
        subquery: Box<Select>,
        alias: Option<String>,
    },
    Join(Box<Join>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub left: TableExpr,
    pub right: TableExpr,
    pub constraint: JoinConstraint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JoinConstraint {
    On(Cond),
    Using(Vec<String>),
    Natural,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Mapping hint written as a block comment right after the table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<TableAnnotation>,
}

impl TableRef {
    pub fn new<S: Into<String>>(name: S) -> Self {
        TableRef {
            name: name.into(),
            schema: None,
            alias: None,
            annotation: None,
        }
    }

    pub fn with_alias<S: Into<String>>(mut self, alias: S) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The name this table is referred to by within the statement.
    pub fn binding_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// `/* label=Person */` or `/* start=Person, type=ACTED_IN, end=Movie */`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TableAnnotation {
    pub label: Option<String>,
    pub rel_type: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insert {
    pub table: TableRef,
    pub columns: Vec<ColumnRef>,
    /// One entry per `VALUES` row, each as wide as `columns`.
    pub rows: Vec<Vec<Expr>>,
    pub upsert: Option<Upsert>,
    pub returning: Vec<SelectItem>,
}

/// `ON DUPLICATE KEY ...`, `ON CONFLICT ...` or `INSERT IGNORE`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Upsert {
    /// Conflict target columns; empty when the whole row identifies the entity.
    pub merge_keys: Vec<String>,
    /// Assignments applied when the row already exists.
    pub on_match: Vec<Assignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub column: ColumnRef,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub table: TableRef,
    pub assignments: Vec<Assignment>,
    pub selection: Option<Cond>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delete {
    pub table: TableRef,
    pub selection: Option<Cond>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Truncate {
    pub tables: Vec<TableRef>,
}
