//! Cypher AST.
//!
//! Only covers what the translator produces. Built bottom-up and never
//! mutated once handed to the renderer.

use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Statement {
    pub clauses: Vec<Clause>,
}

#[derive(Debug, Clone, PartialEq, EnumAsInner, Serialize, Deserialize, strum::AsRefStr)]
pub enum Clause {
    Match {
        patterns: Vec<Pattern>,
        predicate: Option<Expr>,
    },
    Create {
        patterns: Vec<Pattern>,
    },
    Merge {
        pattern: Pattern,
        on_create: Vec<SetItem>,
        on_match: Vec<SetItem>,
    },
    Delete {
        targets: Vec<Expr>,
        detach: bool,
    },
    Set {
        items: Vec<SetItem>,
    },
    /// `WITH`, used to separate the parts of multi-part statements.
    With {
        items: Vec<ReturnItem>,
    },
    Return(Return),
    /// `UNWIND list AS alias`, followed by the clauses run for each element.
    Unwind {
        list: Expr,
        alias: String,
        body: Vec<Clause>,
    },
    /// A statement that does nothing.
    Finish,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Return {
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub distinct: bool,
    pub items: Vec<ReturnItem>,
    pub order_by: Vec<SortItem>,
    pub skip: Option<Expr>,
    pub limit: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl ReturnItem {
    pub fn new(expr: Expr) -> Self {
        ReturnItem { expr, alias: None }
    }

    pub fn aliased<S: Into<String>>(expr: Expr, alias: S) -> Self {
        ReturnItem {
            expr,
            alias: Some(alias.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortItem {
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

/// `target = value`, where the target is a property or a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetItem {
    pub target: Expr,
    pub value: Expr,
}

impl SetItem {
    pub fn new(target: Expr, value: Expr) -> Self {
        SetItem { target, value }
    }
}

/// A path: a node followed by any number of relationship and node pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub start: NodePattern,
    pub chain: Vec<(RelPattern, NodePattern)>,
}

impl From<NodePattern> for Pattern {
    fn from(start: NodePattern) -> Self {
        Pattern {
            start,
            chain: Vec::new(),
        }
    }
}

impl Pattern {
    pub fn then(mut self, rel: RelPattern, node: NodePattern) -> Self {
        self.chain.push((rel, node));
        self
    }

    pub fn end(&self) -> &NodePattern {
        self.chain.last().map_or(&self.start, |(_, node)| node)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodePattern {
    pub variable: Option<String>,
    pub labels: Vec<String>,
    /// Rendered as a map after the labels, when not empty.
    pub properties: Vec<(String, Expr)>,
}

impl NodePattern {
    pub fn new<V: Into<String>, L: Into<String>>(variable: V, label: L) -> Self {
        NodePattern {
            variable: Some(variable.into()),
            labels: vec![label.into()],
            properties: Vec::new(),
        }
    }

    /// A reference to an already bound node, `(n)`.
    pub fn named<V: Into<String>>(variable: V) -> Self {
        NodePattern {
            variable: Some(variable.into()),
            ..Default::default()
        }
    }

    pub fn with_properties(mut self, properties: Vec<(String, Expr)>) -> Self {
        self.properties = properties;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RelPattern {
    pub variable: Option<String>,
    pub rel_type: Option<String>,
    pub direction: Direction,
    pub properties: Vec<(String, Expr)>,
}

impl RelPattern {
    pub fn new<T: Into<String>>(variable: Option<String>, rel_type: T, direction: Direction) -> Self {
        RelPattern {
            variable,
            rel_type: Some(rel_type.into()),
            direction,
            properties: Vec::new(),
        }
    }

    pub fn with_properties(mut self, properties: Vec<(String, Expr)>) -> Self {
        self.properties = properties;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    /// `-[]->`
    #[default]
    LeftToRight,
    /// `<-[]-`
    RightToLeft,
    /// `-[]-`
    Undirected,
}

#[derive(Debug, Clone, PartialEq, EnumAsInner, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    /// `$name`
    Parameter(String),
    Variable(String),
    /// `subject.name`
    Property {
        subject: Box<Expr>,
        name: String,
    },
    /// `subject[key]`
    DynamicProperty {
        subject: Box<Expr>,
        key: Box<Expr>,
    },
    FunctionCall {
        name: String,
        #[serde(skip_serializing_if = "std::ops::Not::not", default)]
        distinct: bool,
        args: Vec<Expr>,
    },
    CountStar,
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    Unary {
        op: UnOp,
        expr: Box<Expr>,
    },
    Case {
        operand: Option<Box<Expr>>,
        branches: Vec<(Expr, Expr)>,
        default: Option<Box<Expr>>,
    },
    List(Vec<Expr>),
    Map(Vec<(String, Expr)>),
    /// `subject{.*}`
    MapProjection {
        subject: String,
    },
    Star,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Boolean(bool),
    Number(String),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum BinOp {
    #[strum(to_string = "+")]
    Add,
    #[strum(to_string = "-")]
    Sub,
    #[strum(to_string = "*")]
    Mul,
    #[strum(to_string = "/")]
    Div,
    #[strum(to_string = "%")]
    Mod,
    #[strum(to_string = "^")]
    Pow,

    #[strum(to_string = "=")]
    Eq,
    #[strum(to_string = "<>")]
    Ne,
    #[strum(to_string = "<")]
    Lt,
    #[strum(to_string = "<=")]
    Lte,
    #[strum(to_string = ">")]
    Gt,
    #[strum(to_string = ">=")]
    Gte,

    #[strum(to_string = "AND")]
    And,
    #[strum(to_string = "OR")]
    Or,
    #[strum(to_string = "XOR")]
    Xor,

    #[strum(to_string = "IN")]
    In,
    #[strum(to_string = "STARTS WITH")]
    StartsWith,
    #[strum(to_string = "ENDS WITH")]
    EndsWith,
    #[strum(to_string = "CONTAINS")]
    Contains,
    #[strum(to_string = "=~")]
    RegexMatch,
}

impl BinOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod | BinOp::Pow
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or | BinOp::Xor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Not,
    IsNull,
    IsNotNull,
}

impl Expr {
    pub fn null() -> Expr {
        Expr::Literal(Literal::Null)
    }

    pub fn string<S: Into<String>>(s: S) -> Expr {
        Expr::Literal(Literal::String(s.into()))
    }

    pub fn var<S: Into<String>>(name: S) -> Expr {
        Expr::Variable(name.into())
    }

    pub fn property<S: Into<String>>(self, name: S) -> Expr {
        Expr::Property {
            subject: Box::new(self),
            name: name.into(),
        }
    }

    pub fn index(self, key: Expr) -> Expr {
        Expr::DynamicProperty {
            subject: Box::new(self),
            key: Box::new(key),
        }
    }

    pub fn call<S: Into<String>>(name: S, args: Vec<Expr>) -> Expr {
        Expr::FunctionCall {
            name: name.into(),
            distinct: false,
            args,
        }
    }

    pub fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnOp, expr: Expr) -> Expr {
        Expr::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    pub fn and(self, other: Expr) -> Expr {
        Expr::binary(self, BinOp::And, other)
    }

    pub fn or(self, other: Expr) -> Expr {
        Expr::binary(self, BinOp::Or, other)
    }

    pub fn not(self) -> Expr {
        Expr::unary(UnOp::Not, self)
    }

    pub fn element_id(self) -> Expr {
        Expr::call("elementId", vec![self])
    }
}
