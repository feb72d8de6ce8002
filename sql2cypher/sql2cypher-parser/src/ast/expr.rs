use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

/// A column reference, optionally qualified by a table name or alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new<S: Into<String>>(qualifier: Option<S>, name: S) -> Self {
        ColumnRef {
            qualifier: qualifier.map(Into::into),
            name: name.into(),
        }
    }

    pub fn bare<S: Into<String>>(name: S) -> Self {
        ColumnRef {
            qualifier: None,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(qualifier) = &self.qualifier {
            write!(f, "{qualifier}.")?;
        }
        f.write_str(&self.name)
    }
}

/// Scalar expression.
#[derive(Debug, Clone, PartialEq, EnumAsInner, Serialize, Deserialize, strum::AsRefStr)]
pub enum Expr {
    Column(ColumnRef),
    Literal(Literal),
    Param(Param),

    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },

    /// Unary minus applied to anything but a numeric literal.
    Negate(Box<Expr>),

    Function(FunctionCall),

    SimpleCase {
        operand: Box<Expr>,
        branches: Vec<(Expr, Expr)>,
        default: Option<Box<Expr>>,
    },
    SearchedCase {
        branches: Vec<(Cond, Expr)>,
        default: Option<Box<Expr>>,
    },

    Cast {
        expr: Box<Expr>,
        target: CastTarget,
    },

    /// `EXTRACT(unit FROM expr)`; the unit is upper-cased.
    Extract {
        unit: String,
        expr: Box<Expr>,
    },

    Substring {
        expr: Box<Expr>,
        from: Option<Box<Expr>>,
        length: Option<Box<Expr>>,
    },

    Trim {
        expr: Box<Expr>,
        side: TrimSide,
        /// `TRIM(BOTH 'x' FROM ...)`
        characters: Option<Box<Expr>>,
    },

    /// Row value, `(a, b)`.
    Tuple(Vec<Expr>),

    /// Column of the row that an upsert tried to insert: `EXCLUDED.col` or
    /// `VALUES(col)`.
    Excluded(String),

    /// `*` as a function argument, as in `count(*)`.
    Wildcard,

    /// A boolean-valued condition used as a value.
    Condition(Box<Cond>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Boolean(bool),
    /// Kept verbatim, so that `1.50` stays `1.50`.
    Number(String),
    String(String),
}

/// A statement parameter placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Param {
    /// `?`
    Anonymous,
    /// `:name`, or the configured named-parameter prefix
    Named(String),
    /// `$1`
    Indexed(usize),
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
    #[strum(to_string = "||")]
    Concat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name as written, without schema qualification.
    pub name: String,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub distinct: bool,
    pub args: Vec<Expr>,
}

impl FunctionCall {
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastTarget {
    String,
    Boolean,
    Float,
    Integer,
    /// Anything else, kept as written.
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrimSide {
    Both,
    Leading,
    Trailing,
}

/// Boolean condition, as found in WHERE, ON and CASE WHEN.
#[derive(Debug, Clone, PartialEq, EnumAsInner, Serialize, Deserialize, strum::AsRefStr)]
pub enum Cond {
    And(Box<Cond>, Box<Cond>),
    Or(Box<Cond>, Box<Cond>),
    Xor(Box<Cond>, Box<Cond>),
    Not(Box<Cond>),

    Compare {
        left: Expr,
        op: CompareOp,
        right: Expr,
    },
    IsNull {
        expr: Expr,
        negated: bool,
    },
    InList {
        expr: Expr,
        list: Vec<Expr>,
        negated: bool,
    },
    Between {
        expr: Expr,
        low: Expr,
        high: Expr,
        negated: bool,
        symmetric: bool,
    },
    Like {
        expr: Expr,
        pattern: Expr,
        negated: bool,
        case_insensitive: bool,
    },
    /// `RLIKE` / `REGEXP`
    RegexMatch {
        expr: Expr,
        pattern: Expr,
        negated: bool,
    },

    Literal(bool),

    /// Any expression in a boolean position, such as a function call or a
    /// boolean column.
    Expr(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum CompareOp {
    #[strum(to_string = "=")]
    Eq,
    #[strum(to_string = "<>")]
    NotEq,
    #[strum(to_string = "<")]
    Lt,
    #[strum(to_string = "<=")]
    LtEq,
    #[strum(to_string = ">")]
    Gt,
    #[strum(to_string = ">=")]
    GtEq,
}

impl CompareOp {
    /// `<=` becomes `<` and `>=` becomes `>`; everything else is unchanged.
    pub fn strict(self) -> Self {
        match self {
            CompareOp::LtEq => CompareOp::Lt,
            CompareOp::GtEq => CompareOp::Gt,
            op => op,
        }
    }

    pub fn is_ordering(self) -> bool {
        !matches!(self, CompareOp::Eq | CompareOp::NotEq)
    }
}
