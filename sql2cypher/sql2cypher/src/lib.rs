//! # sql2cypher
//!
//! Translates SQL statements into Cypher queries over a property graph.
//! Tables map to node labels or, when they join two labels, to relationship
//! types; the mapping comes from [Options], from inline annotations and
//! optionally from a [MetadataLookup].
//!
//! You probably want to start with the [translate] wrapper function, or with
//! a [Translator] when the same options are used over and over.
//!
//! ```ascii
//!            SQL
//!
//!    (parse) │
//!            ▼
//!     relational model      (sql2cypher-parser)
//!            │
//! (translate)│ ◄── Options, MetadataLookup
//!            ▼        json::from_cypher
//!                   ────────►
//!        Cypher AST            Cypher AST JSON
//!                   ◄────────
//!            │        json::to_cypher
//!   (render) │
//!            ▼
//!
//!          Cypher
//! ```
//!
//! ## Common use-cases
//!
//! ```
//! # fn main() -> Result<(), sql2cypher::Error> {
//! let options = sql2cypher::Options::default().with_table_mapping("Actors", "Person");
//! let cypher = sql2cypher::translate("SELECT name FROM Actors", &options)?;
//! assert_eq!(cypher, "MATCH (actors:Person) RETURN actors.name AS name");
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! * `cli`: enables the `sql2cypher` CLI binary. This is enabled by default.
//!   When consuming this crate from another rust library, it can be disabled.
#![forbid(unsafe_code)]
// Our error type carries the offending SQL text and a few strings; we're not
// performance sensitive enough for boxing it to be worth it.
#![allow(clippy::result_large_err)]

pub use sql2cypher_parser::error::{self, Error, Reason, WithErrorInfo};
pub use sql2cypher_parser::{ast, Dialect, NameCase, ParseOptions};

pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod codegen;
pub mod ir;
mod options;
pub mod schema;
mod translate;
pub(crate) mod utils;

pub use cache::TranslationCache;
pub use options::{Options, RelationshipPattern};
pub use schema::{MetadataLookup, RelationshipTable, StaticMetadata};

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Translate a SQL statement into Cypher.
///
/// This is a wrapper for:
/// - [sql_to_ast]: parses SQL into the relational model
/// - [ast_to_ir]: resolves tables and builds the Cypher AST
/// - [ir_to_cypher]: renders the Cypher AST into text
///
/// Input made of nothing but whitespace and comments translates to `FINISH`.
pub fn translate(sql: &str, options: &Options) -> Result<String> {
    translate_inner(sql, options, None)
}

/// Like [translate], but resolves tables and columns against `metadata`.
///
/// With metadata, `SELECT *` expands into the known columns and unqualified
/// columns of joins are attributed to their tables.
pub fn translate_with_metadata(
    sql: &str,
    options: &Options,
    metadata: &dyn MetadataLookup,
) -> Result<String> {
    translate_inner(sql, options, Some(metadata))
}

fn translate_inner(
    sql: &str,
    options: &Options,
    metadata: Option<&dyn MetadataLookup>,
) -> Result<String> {
    let ir = sql_to_ir(sql, options, metadata)?;
    Ok(ir_to_cypher(&ir, options))
}

/// Parse SQL into the relational model.
pub fn sql_to_ast(sql: &str, options: &Options) -> Result<ast::Statement> {
    sql2cypher_parser::parse(sql, &options.parse_options())
}

/// Resolve the tables of a statement and build the Cypher AST.
pub fn ast_to_ir(
    statement: &ast::Statement,
    options: &Options,
    metadata: Option<&dyn MetadataLookup>,
) -> Result<ir::cypher::Statement> {
    translate::translate(statement, options, metadata)
}

/// Parse SQL and build the Cypher AST.
pub fn sql_to_ir(
    sql: &str,
    options: &Options,
    metadata: Option<&dyn MetadataLookup>,
) -> Result<ir::cypher::Statement> {
    let statement = sql_to_ast(sql, options)?;
    ast_to_ir(&statement, options, metadata)
}

/// Render the Cypher AST into text.
pub fn ir_to_cypher(statement: &ir::cypher::Statement, options: &Options) -> String {
    codegen::render(statement, &codegen::WriteOpt::from(options))
}

/// A translator bound to a set of options, caching its translations when
/// [Options::enable_cache] is set.
#[derive(Debug)]
pub struct Translator {
    options: Options,
    cache: Option<TranslationCache>,
}

impl Translator {
    pub fn new(options: Options) -> Result<Self> {
        let cache = if options.enable_cache {
            Some(TranslationCache::new(options.cache_size)?)
        } else {
            None
        };
        Ok(Translator { options, cache })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Where this translator sits among others; lower values come first.
    pub fn order(&self) -> i32 {
        self.options.precedence
    }

    pub fn translate(&mut self, sql: &str) -> Result<String> {
        let options = &self.options;
        match &mut self.cache {
            Some(cache) => cache.get_or_try_insert_with(sql, options, || translate(sql, options)),
            None => translate(sql, options),
        }
    }

    /// Translations against metadata are never cached, as the metadata may
    /// change between calls.
    pub fn translate_with_metadata(
        &mut self,
        sql: &str,
        metadata: &dyn MetadataLookup,
    ) -> Result<String> {
        translate_with_metadata(sql, &self.options, metadata)
    }

    pub fn flush_cache(&mut self) {
        if let Some(cache) = &mut self.cache {
            cache.flush();
        }
    }

    pub fn cache(&self) -> Option<&TranslationCache> {
        self.cache.as_ref()
    }
}

/// JSON serialization and deserialization functions
pub mod json {
    use super::*;

    /// JSON serialization
    pub fn from_cypher(statement: &ir::cypher::Statement) -> Result<String> {
        serde_json::to_string(statement).map_err(convert_json_err)
    }

    /// JSON deserialization
    pub fn to_cypher(json: &str) -> Result<ir::cypher::Statement> {
        serde_json::from_str(json).map_err(convert_json_err)
    }

    fn convert_json_err(err: serde_json::Error) -> Error {
        Error::new_simple(err.to_string())
    }
}
