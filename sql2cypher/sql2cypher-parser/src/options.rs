use serde::{Deserialize, Serialize};
use sqlparser::dialect as sp;

/// SQL dialect the input is parsed with.
///
/// Only parsing is affected; the output is always Cypher.
#[derive(
    Debug,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
    Serialize,
    Default,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::VariantNames,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Dialect {
    Ansi,
    BigQuery,
    ClickHouse,
    DuckDb,
    #[default]
    #[strum(to_string = "generic", serialize = "default")]
    Generic,
    MsSql,
    MySql,
    #[strum(to_string = "postgres", serialize = "postgresql")]
    Postgres,
    SQLite,
    Snowflake,
}

impl Dialect {
    pub(crate) fn parser_dialect(&self) -> Box<dyn sp::Dialect> {
        match self {
            Dialect::Ansi => Box::new(sp::AnsiDialect {}),
            Dialect::BigQuery => Box::new(sp::BigQueryDialect {}),
            Dialect::ClickHouse => Box::new(sp::ClickHouseDialect {}),
            Dialect::DuckDb => Box::new(sp::DuckDbDialect {}),
            Dialect::Generic => Box::new(sp::GenericDialect {}),
            Dialect::MsSql => Box::new(sp::MsSqlDialect {}),
            Dialect::MySql => Box::new(sp::MySqlDialect {}),
            Dialect::Postgres => Box::new(sp::PostgreSqlDialect {}),
            Dialect::SQLite => Box::new(sp::SQLiteDialect {}),
            Dialect::Snowflake => Box::new(sp::SnowflakeDialect {}),
        }
    }
}

/// How identifiers are cased, when read from SQL or written as Cypher.
#[derive(
    Debug,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
    Serialize,
    Default,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum NameCase {
    #[default]
    #[strum(to_string = "AS_IS", serialize = "DEFAULT")]
    AsIs,
    Lower,
    LowerIfUnquoted,
    Upper,
    UpperIfUnquoted,
}

impl NameCase {
    pub fn apply(&self, name: &str, quoted: bool) -> String {
        match self {
            NameCase::Lower => name.to_lowercase(),
            NameCase::LowerIfUnquoted if !quoted => name.to_lowercase(),
            NameCase::Upper => name.to_uppercase(),
            NameCase::UpperIfUnquoted if !quoted => name.to_uppercase(),
            _ => name.to_string(),
        }
    }
}

/// Everything [crate::parse] needs to know.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ParseOptions {
    pub dialect: Dialect,
    pub name_case: NameCase,
    /// Extra prefix marking named parameters, next to `:name`.
    pub named_param_prefix: Option<String>,
}
