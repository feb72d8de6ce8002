//! Parses SQL text into a closed relational model.
//!
//! `sqlparser` does the heavy lifting; we run a small token pass in front of
//! it and then reduce its (very large) AST to the subset of SQL that has a
//! Cypher counterpart. Anything outside that subset is rejected here, with an
//! [error::Reason::Unsupported] error.

pub mod ast;
mod convert;
pub mod error;
mod options;
mod preprocess;

use sqlparser::parser::Parser;

pub use self::options::{Dialect, NameCase, ParseOptions};
use crate::ast::Statement;
use crate::error::{Error, Reason, Result, WithErrorInfo};

/// Parse a single SQL statement.
///
/// Input made of nothing but whitespace and comments parses to
/// [Statement::Empty].
pub fn parse(sql: &str, options: &ParseOptions) -> Result<Statement> {
    let dialect = options.dialect.parser_dialect();

    if preprocess::is_blank(dialect.as_ref(), sql) {
        log::debug!("blank input, nothing to parse");
        return Ok(Statement::Empty);
    }

    let mut pre = preprocess::preprocess(dialect.as_ref(), sql)?;
    let tokens = std::mem::take(&mut pre.tokens);

    let statements = Parser::new(dialect.as_ref())
        .with_tokens_with_locations(tokens)
        .parse_statements()
        .map_err(|e| {
            Error::new(Reason::Parse {
                sql: sql.to_string(),
                message: e.to_string(),
            })
        })?;

    let statement = match statements.as_slice() {
        [] => return Ok(Statement::Empty),
        [statement] => statement,
        _ => {
            return Err(Error::new_unsupported(
                "Unsupported SQL expression: more than one statement",
            ))
            .push_hint("translate each statement on its own");
        }
    };
    log::debug!("sqlparser AST: {statement:?}");

    let statement = convert::Converter::new(options, &pre).statement(statement)?;
    log::debug!("relational model: {statement:?}");
    Ok(statement)
}
