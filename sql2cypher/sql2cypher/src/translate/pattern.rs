//! Turns a FROM clause into Cypher patterns.
//!
//! Joins are folded left to right. A join `X JOIN B` needs a relationship
//! type, which comes either from a table in the middle of the chain
//! (`X JOIN M JOIN B`), from the joined column of an `ON l.a = r.b` equality
//! or from the first column of `USING (c)`.

use crate::ast::{CompareOp, Cond, Expr as SqlExpr, Join, JoinConstraint, TableExpr, TableRef};
use crate::ir::cypher::{Direction, NodePattern, Pattern, RelPattern};
use crate::schema::{ResolvedTable, SchemaMapping};
use crate::{Error, Options, Result, WithErrorInfo};

use super::{unsupported, Context, LHS, RHS};

pub(super) fn build_patterns(from: &[TableExpr], ctx: &mut Context) -> Result<Vec<Pattern>> {
    let patterns = (from.iter())
        .map(|table| build_pattern(table, ctx))
        .collect::<Result<Vec<_>>>()?;
    log::debug!("patterns: {patterns:?}");
    Ok(patterns)
}

fn build_pattern(table: &TableExpr, ctx: &mut Context) -> Result<Pattern> {
    match table {
        TableExpr::Table(table) => leaf(table, ctx),
        TableExpr::Join(join) => join_pattern(join, ctx),
        TableExpr::Derived { .. } => unsupported("derived table in a join"),
    }
}

fn resolved<'c>(table: &TableRef, ctx: &'c Context) -> Result<&'c ResolvedTable> {
    (ctx.schema.get(table))
        .ok_or_else(|| Error::new_assert(format!("table `{}` was never resolved", table.name)))
}

/// A single table: a node, or a whole relationship with both endpoints.
fn leaf(table: &TableRef, ctx: &Context) -> Result<Pattern> {
    let resolved = resolved(table, ctx)?;

    Ok(match &resolved.mapping {
        SchemaMapping::Node { label } => NodePattern::new(&resolved.variable, label).into(),
        SchemaMapping::Relationship(rel) => Pattern::from(NodePattern::new(LHS, &rel.lhs_label))
            .then(
                RelPattern::new(
                    Some(resolved.variable.clone()),
                    &rel.rel_type,
                    Direction::LeftToRight,
                ),
                NodePattern::new(RHS, &rel.rhs_label),
            ),
    })
}

/// Right-hand side of a join, which must be a node.
fn node(table: &TableExpr, ctx: &Context) -> Result<NodePattern> {
    let TableExpr::Table(table) = table else {
        return unsupported("derived table in a join");
    };
    let resolved = resolved(table, ctx)?;
    match &resolved.mapping {
        SchemaMapping::Node { label } => Ok(NodePattern::new(&resolved.variable, label)),
        SchemaMapping::Relationship(_) => unsupported(format!(
            "join to the relationship table `{}` without a table to continue with",
            table.name
        )),
    }
}

fn join_pattern(join: &Join, ctx: &mut Context) -> Result<Pattern> {
    let equality = match &join.constraint {
        JoinConstraint::On(Cond::Compare {
            left: SqlExpr::Column(left),
            op: CompareOp::Eq,
            right: SqlExpr::Column(right),
        }) => Some((left, right)),
        _ => None,
    };

    let (lhs, rel_type, variable, middle) = match &join.left {
        // X JOIN M JOIN B: M is the relationship
        TableExpr::Join(inner) => {
            let lhs = build_pattern(&inner.left, ctx)?;
            let TableExpr::Table(middle) = &inner.right else {
                return unsupported("derived table in a join");
            };
            let rel_type = resolved(middle, ctx)?.mapping.label_or_type().to_string();
            let variable = (middle.alias.as_ref())
                .map_or_else(|| rel_type.to_lowercase(), |alias| alias.to_lowercase());
            (lhs, rel_type, variable, Some(middle))
        }
        left => {
            let TableExpr::Table(left_table) = left else {
                return unsupported("derived table in a join");
            };
            let column = match (&equality, &join.constraint) {
                (Some((_, right)), _) => &right.name,
                (None, JoinConstraint::Using(columns)) if !columns.is_empty() => &columns[0],
                _ => {
                    return unsupported(format!(
                        "join of `{}` without a relationship type",
                        left_table.binding_name()
                    ))
                    .push_hint(
                        "join on a single column equality, join `USING` a column or join through a relationship table",
                    )
                }
            };
            let rel_type = relationship_type(left_table, column, ctx.options);
            let lhs = build_pattern(left, ctx)?;
            (lhs, rel_type.clone(), rel_type.to_lowercase(), None)
        }
    };

    let rhs = node(&join.right, ctx)?;

    let right_alias = match &join.right {
        TableExpr::Table(table) => table.alias.as_deref(),
        _ => None,
    };
    let direction = match (equality, right_alias) {
        (Some((_, right)), Some(alias))
            if right
                .qualifier
                .as_deref()
                .is_some_and(|q| q.eq_ignore_ascii_case(alias)) =>
        {
            Direction::RightToLeft
        }
        _ => Direction::LeftToRight,
    };

    if let Some(middle) = middle {
        let start = lhs.end().variable.clone().unwrap_or_default();
        let end = rhs.variable.clone().unwrap_or_default();
        if let Some(table) = ctx.schema.tables.iter_mut().find(|t| &t.table == middle) {
            table.variable = variable.clone();
            table.endpoints = Some((start, end));
        }
    }

    let rel = RelPattern::new(Some(variable), rel_type, direction);
    Ok(lhs.then(rel, rhs))
}

/// The type of the relationship a join on `table.column` stands for.
fn relationship_type(table: &TableRef, column: &str, options: &Options) -> String {
    let key = format!("{}.{}", table.name, column);

    (options.join_columns_to_type_mappings.iter())
        .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        .map_or_else(|| column.to_uppercase(), |(_, rel_type)| rel_type.clone())
}
