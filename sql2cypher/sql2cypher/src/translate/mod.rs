//! Translation of the relational model into the Cypher AST.
//!
//! A statement is translated in one pass: its tables are resolved into a
//! [ResolvedSchema] up front, the FROM clause becomes a set of patterns and
//! then every expression is rewritten against the bindings those patterns
//! introduce.

mod expr;
mod pattern;
mod statement;

use std::collections::HashMap;

use itertools::Itertools;

use crate::ast::{self, ColumnRef, TableExpr, TableRef};
use crate::ir::cypher::{self, Expr};
use crate::schema::{MetadataLookup, Owner, ResolvedSchema, ResolvedTable, SchemaMapping};
use crate::utils::{ParameterNameGenerator, UniqueNameGenerator};
use crate::{Error, Options, Result, WithErrorInfo};

pub use statement::translate_statement;

/// Variables of the endpoints of a table that stands for a relationship.
pub(crate) const LHS: &str = "_lhs";
pub(crate) const RHS: &str = "_rhs";

/// The identity of an entity, exposed as a column.
pub(crate) const ID_COLUMN: &str = "v$id";

pub(crate) fn unsupported<T>(what: impl std::fmt::Display) -> Result<T> {
    Err(Error::new_unsupported(format!(
        "Unsupported SQL expression: {what}"
    )))
}

/// How to treat a column that no table of the statement claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Unresolved {
    /// Fail with an unresolvable schema error.
    Reject,
    /// Refer to a Cypher variable of the same name.
    AsVariable,
}

/// State of a single translation.
pub(crate) struct Context<'a> {
    pub options: &'a Options,
    pub metadata: Option<&'a dyn MetadataLookup>,
    pub schema: ResolvedSchema,
    pub params: ParameterNameGenerator,
    pub return_names: UniqueNameGenerator,

    /// Values of the row an upsert tried to insert, by column.
    pub excluded: HashMap<String, Expr>,

    pub unresolved: Unresolved,
}

impl<'a> Context<'a> {
    pub fn new(options: &'a Options, metadata: Option<&'a dyn MetadataLookup>) -> Self {
        Context {
            options,
            metadata,
            schema: ResolvedSchema::default(),
            params: ParameterNameGenerator::new(),
            return_names: UniqueNameGenerator::new(),
            excluded: HashMap::new(),
            unresolved: Unresolved::Reject,
        }
    }

    /// Resolves `tables` and makes them the bindings of the statement.
    pub fn bind<'t, I>(&mut self, tables: I) -> Result<()>
    where
        I: IntoIterator<Item = &'t TableRef>,
    {
        self.schema = ResolvedSchema::build(tables, self.options, self.metadata)?;
        Ok(())
    }

    /// Runs `f` with a different policy for unresolved columns.
    pub fn with_unresolved<T, F>(&mut self, unresolved: Unresolved, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let previous = std::mem::replace(&mut self.unresolved, unresolved);
        let result = f(self);
        self.unresolved = previous;
        result
    }

    pub fn resolve_column(&self, column: &ColumnRef) -> Result<Expr> {
        if let Some(identity) = self.resolve_identity(column) {
            return Ok(identity);
        }

        if let Some(qualifier) = &column.qualifier {
            if let Some(table) = self.schema.find(qualifier) {
                return Ok(property_of(table, column));
            }

            // the endpoints of a relationship table may be named by their labels
            let owning_relationship = self.schema.tables.iter().find(|t| {
                t.mapping.as_relationship().is_some_and(|rel| {
                    [&rel.lhs_label, &rel.rhs_label, &rel.rel_type]
                        .iter()
                        .any(|name| name.eq_ignore_ascii_case(qualifier))
                })
            });
            if let Some(table) = owning_relationship {
                return Ok(property_of(table, column));
            }

            return Ok(Expr::var(qualifier.to_lowercase()).property(&column.name));
        }

        match self.schema.tables.as_slice() {
            [table] if table.variable == column.name => Ok(Expr::var(&column.name)),
            [table] => Ok(property_of(table, column)),
            tables => {
                if let Some(table) = tables.iter().find(|t| t.has_column(&column.name)) {
                    return Ok(property_of(table, column));
                }
                match self.unresolved {
                    Unresolved::AsVariable => Ok(Expr::var(&column.name)),
                    Unresolved::Reject => Err(Error::new_unresolvable(format!(
                        "Column `{}` could not be resolved against the tables {}",
                        column.name,
                        self.describe_tables()
                    )))
                    .push_hint("qualify the column with the name or alias of its table"),
                }
            }
        }
    }

    /// `v$id` and `v$<name>_id` refer to the identity of an element.
    fn resolve_identity(&self, column: &ColumnRef) -> Option<Expr> {
        let name = column.name.to_lowercase();
        let name = name.strip_prefix("v$")?;

        let table = match &column.qualifier {
            Some(qualifier) => self.schema.find(qualifier),
            None => match self.schema.tables.as_slice() {
                [table] => Some(table),
                _ => None,
            },
        };

        if name == "id" {
            let table = table?;
            return Some(Expr::var(&table.variable).element_id());
        }

        let element = name.strip_suffix("_id")?;
        if let Some(table) = table {
            if let SchemaMapping::Relationship(rel) = &table.mapping {
                if element == rel.lhs_label.to_lowercase() {
                    return Some(Expr::var(LHS).element_id());
                }
                if element == rel.rhs_label.to_lowercase() {
                    return Some(Expr::var(RHS).element_id());
                }
            }
        }
        self.schema
            .tables
            .iter()
            .find(|t| t.variable == element)
            .map(|t| Expr::var(&t.variable).element_id())
    }

    fn describe_tables(&self) -> String {
        let names: Vec<_> = (self.schema.tables.iter())
            .map(|t| format!("`{}`", t.table.binding_name()))
            .collect();
        names.join(", ")
    }
}

/// A property of the element `table` is bound to, routed to the right
/// element when the table stands for a relationship.
fn property_of(table: &ResolvedTable, column: &ColumnRef) -> Expr {
    element_of(table, column).property(&column.name)
}

fn element_of(table: &ResolvedTable, column: &ColumnRef) -> Expr {
    match &table.mapping {
        SchemaMapping::Relationship(rel) if table.endpoints.is_none() => {
            match rel.owner_of(column) {
                Owner::Lhs => Expr::var(LHS),
                Owner::Rhs => Expr::var(RHS),
                Owner::Rel => Expr::var(&table.variable),
            }
        }
        _ => Expr::var(&table.variable),
    }
}

/// Every table reference of a FROM clause, left to right.
pub(crate) fn collect_tables<'t>(from: &'t [TableExpr], tables: &mut Vec<&'t TableRef>) -> Result<()> {
    for table in from {
        match table {
            TableExpr::Table(table) => tables.push(table),
            TableExpr::Join(join) => {
                collect_tables(std::slice::from_ref(&join.left), tables)?;
                collect_tables(std::slice::from_ref(&join.right), tables)?;
            }
            TableExpr::Derived { .. } => {
                return unsupported("derived table outside of the first FROM item")
            }
        }
    }
    Ok(())
}

/// Translates a parsed statement into the Cypher AST.
pub fn translate(
    statement: &ast::Statement,
    options: &Options,
    metadata: Option<&dyn MetadataLookup>,
) -> Result<cypher::Statement> {
    let mut ctx = Context::new(options, metadata);
    let statement = translate_statement(statement, &mut ctx)?;
    log::debug!(
        "clauses: {}",
        statement.clauses.iter().map(AsRef::<str>::as_ref).join(", ")
    );
    log::trace!("cypher AST: {statement:?}");
    Ok(statement)
}
