//! Statement builders: one per kind of SQL statement.

use itertools::Itertools;

use crate::ast::{self, ColumnRef, Insert, SelectItem, TableExpr, TableRef};
use crate::ir::cypher::{
    Clause, Direction, Expr, Literal, NodePattern, Pattern, RelPattern, Return, ReturnItem,
    SetItem, SortDirection, SortItem, Statement,
};
use crate::schema::{columns_of, Owner, RelationshipMapping, ResolvedTable, SchemaMapping};
use crate::utils::UniqueNameGenerator;
use crate::{Error, Result, WithErrorInfo};

use super::expr::{translate_cond, translate_expr};
use super::pattern::build_patterns;
use super::{collect_tables, element_of, unsupported, Context, Unresolved, ID_COLUMN, LHS, RHS};

/// Name of the list element in `UNWIND ... AS properties`.
const PROPERTIES: &str = "properties";

pub fn translate_statement(statement: &ast::Statement, ctx: &mut Context) -> Result<Statement> {
    let clauses = match statement {
        ast::Statement::Select(select) => translate_select(select, ctx)?,
        ast::Statement::Insert(insert) => translate_insert(insert, ctx)?,
        ast::Statement::Update(update) => translate_update(update, ctx)?,
        ast::Statement::Delete(delete) => translate_delete(delete, ctx)?,
        ast::Statement::Truncate(truncate) => translate_truncate(truncate, ctx)?,
        ast::Statement::Empty => vec![Clause::Finish],
    };
    Ok(Statement { clauses })
}

fn translate_select(select: &ast::Select, ctx: &mut Context) -> Result<Vec<Clause>> {
    if let [TableExpr::Derived { subquery, .. }] = select.from.as_slice() {
        return translate_derived(select, subquery, ctx);
    }

    if select.having.is_some() {
        return unsupported("HAVING");
    }
    if !select.group_by.is_empty() {
        log::debug!("dropping GROUP BY, grouping is implicit in Cypher");
    }

    let mut tables = Vec::new();
    collect_tables(&select.from, &mut tables)?;
    ctx.bind(tables)?;
    let patterns = build_patterns(&select.from, ctx)?;

    let items = translate_projection(&select.projection, ctx)?;
    let predicate = (select.selection.as_ref())
        .map(|cond| translate_cond(cond, ctx))
        .transpose()?;

    let order_by = ctx.with_unresolved(Unresolved::AsVariable, |ctx| {
        (select.order_by.iter())
            .map(|item| -> Result<_> {
                Ok(SortItem {
                    expr: translate_expr(&item.expr, ctx)?,
                    direction: item.direction.map(|d| match d {
                        ast::SortDirection::Asc => SortDirection::Asc,
                        ast::SortDirection::Desc => SortDirection::Desc,
                    }),
                })
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let limit = (select.limit.as_ref())
        .map(|e| translate_expr(e, ctx))
        .transpose()?;
    let skip = (select.offset.as_ref())
        .map(|e| translate_expr(e, ctx))
        .transpose()?;

    let mut clauses = Vec::new();
    if !patterns.is_empty() {
        clauses.push(Clause::Match {
            patterns,
            predicate,
        });
    } else if predicate.is_some() {
        return unsupported("WHERE without FROM");
    }
    clauses.push(Clause::Return(Return {
        distinct: select.distinct,
        items,
        order_by,
        skip,
        limit,
    }));
    Ok(clauses)
}

/// `SELECT * FROM (SELECT ...) t [WHERE ...]`: the outer query only ever
/// asks for a single row when it filters.
fn translate_derived(
    outer: &ast::Select,
    inner: &ast::Select,
    ctx: &mut Context,
) -> Result<Vec<Clause>> {
    if !matches!(outer.projection.as_slice(), [SelectItem::Wildcard]) {
        return unsupported("projection of a derived table");
    }

    let mut clauses = translate_select(inner, ctx)?;
    if outer.selection.is_some() {
        if let Some(Clause::Return(ret)) = clauses.last_mut() {
            ret.limit = Some(Expr::Literal(Literal::Number("1".to_string())));
        }
    }
    Ok(clauses)
}

fn translate_projection(projection: &[SelectItem], ctx: &mut Context) -> Result<Vec<ReturnItem>> {
    let mut items = Vec::new();

    for item in projection {
        match item {
            SelectItem::Wildcard => {
                let mut expanded = Vec::new();
                if ctx.schema.has_metadata {
                    for index in 0..ctx.schema.tables.len() {
                        expanded.extend(project_all_columns(index, ctx));
                    }
                }
                if expanded.is_empty() {
                    expanded.push(ReturnItem::new(Expr::Star));
                }
                items.extend(expanded);
            }
            SelectItem::QualifiedWildcard(qualifier) => {
                let Some(index) = (ctx.schema.tables.iter()).position(|t| t.is_bound_to(qualifier))
                else {
                    return Err(Error::new_unresolvable(format!(
                        "`{qualifier}.*` does not refer to a table of the statement"
                    )));
                };
                let expanded = project_all_columns(index, ctx);
                if expanded.is_empty() {
                    let variable = ctx.schema.tables[index].variable.clone();
                    items.push(ReturnItem::aliased(
                        Expr::MapProjection {
                            subject: variable.clone(),
                        },
                        variable,
                    ));
                } else {
                    items.extend(expanded);
                }
            }
            SelectItem::Expr { expr, alias } => {
                let translated = ctx.with_unresolved(Unresolved::AsVariable, |ctx| {
                    translate_expr(expr, ctx)
                })?;
                let alias = alias.clone().or_else(|| implicit_alias(expr, &translated, ctx));
                items.push(ReturnItem {
                    expr: translated,
                    alias,
                });
            }
        }
    }
    Ok(items)
}

/// A bare column of a single table keeps its name.
fn implicit_alias(expr: &ast::Expr, translated: &Expr, ctx: &Context) -> Option<String> {
    match (expr, translated) {
        (_, Expr::Variable(_)) => None,
        (ast::Expr::Column(ColumnRef { qualifier: None, name }), _)
            if ctx.schema.tables.len() == 1 =>
        {
            Some(name.clone())
        }
        _ => None,
    }
}

/// Every column metadata knows for the table at `index`, together with the
/// identities of the elements it binds.
fn project_all_columns(index: usize, ctx: &mut Context) -> Vec<ReturnItem> {
    let table = &ctx.schema.tables[index];
    let Some(columns) = &table.columns else {
        return Vec::new();
    };

    let names = &mut ctx.return_names;
    let mut items = Vec::new();

    let endpoints = match (&table.endpoints, &table.mapping) {
        (Some((start, end)), _) => Some((start.clone(), start.clone(), end.clone(), end.clone())),
        (None, SchemaMapping::Relationship(rel)) => Some((
            LHS.to_string(),
            rel.lhs_label.to_lowercase(),
            RHS.to_string(),
            rel.rhs_label.to_lowercase(),
        )),
        (None, SchemaMapping::Node { .. }) => None,
    };

    if let Some((start, start_name, _, _)) = &endpoints {
        items.push(identity(names, start, &format!("v${start_name}_id")));
    }
    items.push(identity(names, &table.variable, ID_COLUMN));
    for column in columns {
        let element = element_of(table, &ColumnRef::bare(column.as_str()));
        let alias = names.gen(column);
        items.push(ReturnItem::aliased(element.property(column), alias));
    }
    if let Some((_, _, end, end_name)) = &endpoints {
        items.push(identity(names, end, &format!("v${end_name}_id")));
    }
    items
}

fn identity(names: &mut UniqueNameGenerator, variable: &str, column: &str) -> ReturnItem {
    ReturnItem::aliased(Expr::var(variable).element_id(), names.gen(column))
}

fn bind_single(table: &TableRef, ctx: &mut Context) -> Result<ResolvedTable> {
    ctx.bind([table])?;
    (ctx.schema.tables.first().cloned())
        .ok_or_else(|| Error::new_assert("table disappeared while binding"))
}

/// The pattern matching every row of a table.
fn full_pattern(table: &ResolvedTable) -> Pattern {
    match &table.mapping {
        SchemaMapping::Node { label } => NodePattern::new(&table.variable, label).into(),
        SchemaMapping::Relationship(rel) => Pattern::from(NodePattern::new(LHS, &rel.lhs_label))
            .then(
                RelPattern::new(
                    Some(table.variable.clone()),
                    &rel.rel_type,
                    Direction::LeftToRight,
                ),
                NodePattern::new(RHS, &rel.rhs_label),
            ),
    }
}

fn translate_insert(insert: &Insert, ctx: &mut Context) -> Result<Vec<Clause>> {
    let table = bind_single(&insert.table, ctx)?;
    let columns = insert_columns(insert, &table, ctx)?;

    let rows: Vec<Vec<Expr>> = (insert.rows.iter())
        .map(|row| -> Result<Vec<Expr>> {
            if row.len() != columns.len() {
                return unsupported(format!(
                    "row of {} values for {} columns",
                    row.len(),
                    columns.len()
                ));
            }
            row.iter().map(|value| translate_expr(value, ctx)).collect()
        })
        .try_collect()?;

    match &table.mapping {
        SchemaMapping::Node { label } => {
            insert_node(insert, &table.variable, label, &columns, rows, ctx)
        }
        SchemaMapping::Relationship(rel) => {
            if insert.upsert.is_some() {
                return Err(Error::new_unsupported(
                    "`ON DUPLICATE` and `ON CONFLICT` clauses are not supported for inserting relationships",
                ));
            }
            if !insert.returning.is_empty() {
                return unsupported("RETURNING from an insert into a relationship table");
            }
            insert_relationship(&table, rel, &columns, rows)
        }
    }
}

/// The columns named by the insert, or every column metadata knows of.
fn insert_columns(insert: &Insert, table: &ResolvedTable, ctx: &Context) -> Result<Vec<ColumnRef>> {
    if !insert.columns.is_empty() {
        return Ok(insert.columns.clone());
    }
    let known = match (&table.columns, ctx.metadata) {
        (Some(columns), _) => columns.clone(),
        (None, Some(metadata)) => columns_of(metadata, &insert.table.name)?,
        (None, None) => Vec::new(),
    };
    if known.is_empty() {
        return unsupported("INSERT without a column list")
            .push_hint("name the columns to insert, as in `INSERT INTO t (a, b) VALUES ...`");
    }
    Ok(known.into_iter().map(ColumnRef::bare).collect())
}

fn insert_node(
    insert: &Insert,
    variable: &str,
    label: &str,
    columns: &[ColumnRef],
    rows: Vec<Vec<Expr>>,
    ctx: &mut Context,
) -> Result<Vec<Clause>> {
    let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
    let property = |name: &str| Expr::var(variable).property(name);
    let multi_row = rows.len() > 1;

    // values of the inserted row, as upserts refer to them
    let values: Vec<Expr> = if multi_row {
        (names.iter())
            .map(|name| Expr::var(PROPERTIES).index(Expr::string(name)))
            .collect()
    } else {
        rows.first().cloned().unwrap_or_default()
    };

    let mut body = match &insert.upsert {
        None if multi_row => vec![
            Clause::Create {
                patterns: vec![NodePattern::new(variable, label).into()],
            },
            Clause::Set {
                items: vec![SetItem::new(Expr::var(variable), Expr::var(PROPERTIES))],
            },
        ],
        None => vec![Clause::Create {
            patterns: vec![NodePattern::new(variable, label)
                .with_properties(names.iter().cloned().zip(values).collect())
                .into()],
        }],
        Some(upsert) => {
            if multi_row && upsert.merge_keys.is_empty() {
                return Err(Error::new_unsupported(
                    "`ON DUPLICATE` and `ON CONFLICT` clauses are not supported when inserting multiple rows without using a property to merge on",
                ));
            }

            ctx.excluded = names.iter().cloned().zip(values.iter().cloned()).collect();

            let is_key = |name: &str| {
                upsert.merge_keys.is_empty()
                    || (upsert.merge_keys.iter()).any(|k| k.eq_ignore_ascii_case(name))
            };
            let mut merge_properties = Vec::new();
            let mut on_create = Vec::new();
            for (name, value) in names.iter().zip(values) {
                if is_key(name) {
                    merge_properties.push((name.clone(), value));
                } else {
                    on_create.push(SetItem::new(property(name), value));
                }
            }

            let on_match = (upsert.on_match.iter())
                .map(|assignment| -> Result<_> {
                    let value = translate_expr(&assignment.value, ctx)?;
                    Ok(SetItem::new(property(&assignment.column.name), value))
                })
                .collect::<Result<Vec<_>>>()?;

            vec![Clause::Merge {
                pattern: NodePattern::new(variable, label)
                    .with_properties(merge_properties)
                    .into(),
                on_create,
                on_match,
            }]
        }
    };

    if !insert.returning.is_empty() {
        body.push(Clause::Return(Return {
            items: translate_projection(&insert.returning, ctx)?,
            ..Default::default()
        }));
    }

    if !multi_row {
        return Ok(body);
    }

    let list = (rows.into_iter())
        .map(|row| Expr::Map(names.iter().cloned().zip(row).collect()))
        .collect();
    Ok(vec![Clause::Unwind {
        list: Expr::List(list),
        alias: PROPERTIES.to_string(),
        body,
    }])
}

/// Column indices of an insert into a relationship table, by the element
/// that owns them.
#[derive(Debug, Default)]
struct Partition {
    lhs: Vec<usize>,
    rel: Vec<usize>,
    rhs: Vec<usize>,
}

impl Partition {
    fn new(columns: &[ColumnRef], rel: &RelationshipMapping) -> Self {
        let mut partition = Partition::default();
        for (index, column) in columns.iter().enumerate() {
            match rel.owner_of(column) {
                Owner::Lhs => partition.lhs.push(index),
                Owner::Rel => partition.rel.push(index),
                Owner::Rhs => partition.rhs.push(index),
            }
        }

        // columns that name their element explicitly come first
        let names_element = |index: &usize| {
            columns[*index].qualifier.as_deref().is_some_and(|q| {
                [&rel.lhs_label, &rel.rel_type, &rel.rhs_label]
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case(q))
            })
        };
        for indices in [&mut partition.lhs, &mut partition.rel, &mut partition.rhs] {
            indices.sort_by_key(|index| !names_element(index));
        }
        partition
    }
}

fn insert_relationship(
    table: &ResolvedTable,
    rel: &RelationshipMapping,
    columns: &[ColumnRef],
    rows: Vec<Vec<Expr>>,
) -> Result<Vec<Clause>> {
    let mut partition = Partition::new(columns, rel);

    let properties = |indices: &[usize], row: &[Expr]| -> Vec<(String, Expr)> {
        (indices.iter())
            .map(|i| (columns[*i].name.clone(), row[*i].clone()))
            .collect()
    };

    if let [row] = rows.as_slice() {
        let endpoint = |variable: &str, label: &str, indices: &[usize]| {
            let node = NodePattern::new(variable, label);
            if indices.is_empty() {
                Clause::Create {
                    patterns: vec![node.into()],
                }
            } else {
                Clause::Merge {
                    pattern: node.with_properties(properties(indices, row)).into(),
                    on_create: Vec::new(),
                    on_match: Vec::new(),
                }
            }
        };

        let create = Pattern::from(NodePattern::named(LHS)).then(
            RelPattern::new(None, &rel.rel_type, Direction::LeftToRight)
                .with_properties(properties(&partition.rel, row)),
            NodePattern::named(RHS),
        );
        return Ok(vec![
            endpoint(LHS, &rel.lhs_label, &partition.lhs),
            endpoint(RHS, &rel.rhs_label, &partition.rhs),
            Clause::Create {
                patterns: vec![create],
            },
        ]);
    }

    for indices in [&mut partition.lhs, &mut partition.rhs] {
        retain_mergeable(indices, columns, &rows)?;
    }

    let list = (rows.iter())
        .map(|row| {
            Expr::Map(vec![
                ("lhs".to_string(), Expr::Map(properties(&partition.lhs, row))),
                ("rel".to_string(), Expr::Map(properties(&partition.rel, row))),
                ("rhs".to_string(), Expr::Map(properties(&partition.rhs, row))),
            ])
        })
        .collect();

    let element = |owner: Owner| Expr::var(PROPERTIES).index(Expr::string(owner.to_string()));
    let set = |variable: &str, owner: Owner| Clause::Set {
        items: vec![SetItem::new(Expr::var(variable), element(owner))],
    };
    let relationship = || {
        RelPattern::new(
            Some(table.variable.clone()),
            &rel.rel_type,
            Direction::LeftToRight,
        )
    };

    let body = if partition.lhs.is_empty() && partition.rhs.is_empty() {
        vec![
            Clause::Create {
                patterns: vec![full_pattern(table)],
            },
            set(LHS, Owner::Lhs),
            set(&table.variable, Owner::Rel),
            set(RHS, Owner::Rhs),
        ]
    } else {
        let endpoint = |variable: &str, label: &str, indices: &[usize], owner: Owner| {
            let node = NodePattern::new(variable, label);
            if indices.is_empty() {
                return Clause::Create {
                    patterns: vec![node.into()],
                };
            }
            let merge_properties = (indices.iter())
                .map(|i| {
                    let name = columns[*i].name.clone();
                    let value = element(owner).index(Expr::string(&name));
                    (name, value)
                })
                .collect();
            Clause::Merge {
                pattern: node.with_properties(merge_properties).into(),
                on_create: Vec::new(),
                on_match: Vec::new(),
            }
        };
        vec![
            endpoint(LHS, &rel.lhs_label, &partition.lhs, Owner::Lhs),
            endpoint(RHS, &rel.rhs_label, &partition.rhs, Owner::Rhs),
            Clause::Create {
                patterns: vec![Pattern::from(NodePattern::named(LHS))
                    .then(relationship(), NodePattern::named(RHS))],
            },
            set(&table.variable, Owner::Rel),
        ]
    };

    Ok(vec![Clause::Unwind {
        list: Expr::List(list),
        alias: PROPERTIES.to_string(),
        body,
    }])
}

/// Endpoint columns are merged on, so every row needs a value for them. A
/// column that is NULL in every row is left out entirely.
fn retain_mergeable(indices: &mut Vec<usize>, columns: &[ColumnRef], rows: &[Vec<Expr>]) -> Result<()> {
    let is_null = |e: &Expr| matches!(e, Expr::Literal(Literal::Null));

    let mut mixed = None;
    indices.retain(|index| {
        let nulls = rows.iter().filter(|row| is_null(&row[*index])).count();
        if nulls > 0 && nulls < rows.len() {
            mixed.get_or_insert(*index);
        }
        nulls < rows.len()
    });

    match mixed {
        Some(index) => unsupported(format!(
            "NULL in only some rows of the column `{}`, which is merged on",
            columns[index]
        )),
        None => Ok(()),
    }
}

fn translate_update(update: &ast::Update, ctx: &mut Context) -> Result<Vec<Clause>> {
    let table = bind_single(&update.table, ctx)?;

    let items = (update.assignments.iter())
        .map(|assignment| -> Result<_> {
            let target = ctx.resolve_column(&assignment.column)?;
            if !matches!(target, Expr::Property { .. }) {
                return unsupported(format!("assignment to `{}`", assignment.column));
            }
            Ok(SetItem::new(target, translate_expr(&assignment.value, ctx)?))
        })
        .collect::<Result<Vec<_>>>()?;

    let predicate = (update.selection.as_ref())
        .map(|cond| translate_cond(cond, ctx))
        .transpose()?;

    Ok(vec![
        Clause::Match {
            patterns: vec![full_pattern(&table)],
            predicate,
        },
        Clause::Set { items },
    ])
}

fn translate_delete(delete: &ast::Delete, ctx: &mut Context) -> Result<Vec<Clause>> {
    let table = bind_single(&delete.table, ctx)?;

    let predicate = (delete.selection.as_ref())
        .map(|cond| translate_cond(cond, ctx))
        .transpose()?;

    Ok(vec![
        Clause::Match {
            patterns: vec![full_pattern(&table)],
            predicate,
        },
        Clause::Delete {
            targets: vec![Expr::var(&table.variable)],
            detach: false,
        },
    ])
}

fn translate_truncate(truncate: &ast::Truncate, ctx: &mut Context) -> Result<Vec<Clause>> {
    ctx.bind(&truncate.tables)?;

    let parts = (ctx.schema.tables.iter()).map(|table| {
        vec![
            Clause::Match {
                patterns: vec![full_pattern(table)],
                predicate: None,
            },
            Clause::Delete {
                targets: vec![Expr::var(&table.variable)],
                // relationships of a node go with it, endpoints of a relationship stay
                detach: table.mapping.is_node(),
            },
        ]
    });

    let separator = vec![Clause::With {
        items: vec![ReturnItem::aliased(Expr::CountStar, "_")],
    }];
    Ok(Itertools::intersperse(parts, separator).flatten().collect())
}
