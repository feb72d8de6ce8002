//! Converts `sqlparser`'s AST into our relational model.

use itertools::Itertools;
use sqlparser::ast::{self as sp, Spanned};

use crate::ast::*;
use crate::error::{Error, Result, WithErrorInfo};
use crate::options::ParseOptions;
use crate::preprocess::{position, Preprocessed};

pub(crate) struct Converter<'a> {
    options: &'a ParseOptions,
    pre: &'a Preprocessed,
    /// Within `ON DUPLICATE KEY UPDATE` / `DO UPDATE`, where `EXCLUDED.x` and
    /// `VALUES(x)` refer to the inserted row.
    in_upsert: bool,
}

fn unsupported<T>(what: impl std::fmt::Display) -> Result<T> {
    Err(Error::new_unsupported(format!("Unsupported SQL expression: {what}")))
}

impl<'a> Converter<'a> {
    pub fn new(options: &'a ParseOptions, pre: &'a Preprocessed) -> Self {
        Converter {
            options,
            pre,
            in_upsert: false,
        }
    }

    pub fn statement(&mut self, statement: &sp::Statement) -> Result<Statement> {
        Ok(match statement {
            sp::Statement::Query(query) => Statement::Select(self.query(query)?),
            sp::Statement::Insert(insert) => Statement::Insert(self.insert(insert)?),
            sp::Statement::Update {
                table,
                assignments,
                from,
                selection,
                ..
            } => {
                if from.is_some() || !table.joins.is_empty() {
                    return unsupported("UPDATE spanning more than one table");
                }
                Statement::Update(Update {
                    table: self.table_factor_ref(&table.relation)?,
                    assignments: self.assignments(assignments)?,
                    selection: selection.as_ref().map(|e| self.cond(e)).transpose()?,
                })
            }
            sp::Statement::Delete(delete) => Statement::Delete(self.delete(delete)?),
            sp::Statement::Truncate { table_names, .. } => Statement::Truncate(Truncate {
                tables: table_names
                    .iter()
                    .map(|target| self.table_ref(&target.name, None))
                    .try_collect()?,
            }),
            other => {
                return Err(Error::new_unsupported(format!(
                    "Unsupported SQL statement: {other}"
                )))
            }
        })
    }

    fn ident(&self, ident: &sp::Ident) -> String {
        (self.options.name_case).apply(&ident.value, ident.quote_style.is_some())
    }

    fn idents<'n>(&self, name: &'n sp::ObjectName) -> Result<Vec<&'n sp::Ident>> {
        name.0
            .iter()
            .map(|part| part.as_ident())
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::new_unsupported(format!("Unsupported SQL name: {name}")))
    }

    fn table_ref(&self, name: &sp::ObjectName, alias: Option<&sp::TableAlias>) -> Result<TableRef> {
        let parts = self.idents(name)?;
        let Some((table, init)) = parts.split_last() else {
            return Err(Error::new_assert("empty table name"));
        };

        let annotation = alias
            .and_then(|a| self.pre.annotations.get(&a.name.value))
            .or_else(|| self.pre.annotations.get(&table.value))
            .cloned();

        Ok(TableRef {
            name: self.ident(table),
            schema: init.last().map(|s| self.ident(s)),
            alias: alias.map(|a| self.ident(&a.name)),
            annotation,
        })
    }

    fn table_factor_ref(&self, factor: &sp::TableFactor) -> Result<TableRef> {
        match factor {
            sp::TableFactor::Table {
                name, alias, args, ..
            } if args.is_none() => self.table_ref(name, alias.as_ref()),
            other => unsupported(other),
        }
    }

    fn column(&self, name: &sp::ObjectName) -> Result<ColumnRef> {
        let parts = self.idents(name)?;
        match parts.as_slice() {
            [.., qualifier, column] => Ok(ColumnRef {
                qualifier: Some(self.ident(qualifier)),
                name: self.ident(column),
            }),
            [column] => Ok(ColumnRef::bare(self.ident(column))),
            [] => Err(Error::new_assert("empty column name")),
        }
    }

    fn assignments(&mut self, assignments: &[sp::Assignment]) -> Result<Vec<Assignment>> {
        assignments
            .iter()
            .map(|assignment| match &assignment.target {
                sp::AssignmentTarget::ColumnName(name) => Ok(Assignment {
                    column: self.column(name)?,
                    value: self.expr(&assignment.value)?,
                }),
                other => unsupported(other),
            })
            .collect()
    }

    pub fn query(&mut self, query: &sp::Query) -> Result<Select> {
        if query.with.is_some() {
            return unsupported("WITH");
        }

        let mut select = match query.body.as_ref() {
            sp::SetExpr::Select(select) => self.select(select)?,
            sp::SetExpr::Query(query) => self.query(query)?,
            other => return unsupported(other),
        };

        if let Some(order_by) = &query.order_by {
            let sp::OrderByKind::Expressions(exprs) = &order_by.kind else {
                return unsupported(order_by);
            };
            for item in exprs {
                select.order_by.push(OrderByItem {
                    expr: self.expr(&item.expr)?,
                    direction: item.options.asc.map(|asc| match asc {
                        true => SortDirection::Asc,
                        false => SortDirection::Desc,
                    }),
                });
            }
        }

        match &query.limit_clause {
            Some(sp::LimitClause::LimitOffset {
                limit,
                offset,
                limit_by,
            }) => {
                if !limit_by.is_empty() {
                    return unsupported("LIMIT BY");
                }
                if let Some(limit) = limit {
                    select.limit = Some(self.expr(limit)?);
                }
                if let Some(offset) = offset {
                    select.offset = Some(self.expr(&offset.value)?);
                }
            }
            Some(sp::LimitClause::OffsetCommaLimit { offset, limit }) => {
                select.offset = Some(self.expr(offset)?);
                select.limit = Some(self.expr(limit)?);
            }
            None => {}
        }

        if let Some(quantity) = query.fetch.as_ref().and_then(|f| f.quantity.as_ref()) {
            select.limit = Some(self.expr(quantity)?);
        }

        Ok(select)
    }

    fn select(&mut self, select: &sp::Select) -> Result<Select> {
        let distinct = match &select.distinct {
            None => false,
            Some(sp::Distinct::Distinct) => true,
            Some(other) => return unsupported(other),
        };

        let projection = (select.projection.iter())
            .map(|item| self.select_item(item))
            .try_collect()?;

        let from = (select.from.iter())
            .map(|t| self.table_with_joins(t))
            .try_collect()?;

        let selection = (select.selection.as_ref())
            .map(|e| self.cond(e))
            .transpose()?;

        let group_by = match &select.group_by {
            sp::GroupByExpr::Expressions(exprs, _) => {
                exprs.iter().map(|e| self.expr(e)).try_collect()?
            }
            other => return unsupported(other),
        };

        let having = select.having.as_ref().map(|e| self.cond(e)).transpose()?;

        let limit = match select.top.as_ref().and_then(|top| top.quantity.as_ref()) {
            Some(sp::TopQuantity::Expr(e)) => Some(self.expr(e)?),
            Some(sp::TopQuantity::Constant(n)) => Some(Expr::Literal(Literal::Number(n.to_string()))),
            None => None,
        };

        Ok(Select {
            distinct,
            projection,
            from,
            selection,
            group_by,
            having,
            limit,
            ..Default::default()
        })
    }

    fn select_item(&mut self, item: &sp::SelectItem) -> Result<SelectItem> {
        Ok(match item {
            sp::SelectItem::UnnamedExpr(expr) => SelectItem::Expr {
                expr: self.expr(expr)?,
                alias: None,
            },
            sp::SelectItem::ExprWithAlias { expr, alias } => SelectItem::Expr {
                expr: self.expr(expr)?,
                alias: Some(self.ident(alias)),
            },
            sp::SelectItem::Wildcard(_) => SelectItem::Wildcard,
            sp::SelectItem::QualifiedWildcard(
                sp::SelectItemQualifiedWildcardKind::ObjectName(name),
                _,
            ) => {
                let parts = self.idents(name)?;
                match parts.last() {
                    Some(qualifier) => SelectItem::QualifiedWildcard(self.ident(qualifier)),
                    None => return Err(Error::new_assert("empty wildcard qualifier")),
                }
            }
            other => return unsupported(other),
        })
    }

    fn table_with_joins(&mut self, table: &sp::TableWithJoins) -> Result<TableExpr> {
        let mut left = self.table_factor(&table.relation)?;

        for join in &table.joins {
            let right = self.table_factor(&join.relation)?;
            let constraint = match &join.join_operator {
                sp::JoinOperator::Join(c) | sp::JoinOperator::Inner(c) => {
                    self.join_constraint(c)?
                }
                _ => {
                    return Err(Error::new_unsupported(
                        "Unsupported join: only inner joins can be translated",
                    ))
                }
            };
            left = TableExpr::Join(Box::new(Join {
                left,
                right,
                constraint,
            }));
        }
        Ok(left)
    }

    fn table_factor(&mut self, factor: &sp::TableFactor) -> Result<TableExpr> {
        match factor {
            sp::TableFactor::Derived {
                subquery, alias, ..
            } => Ok(TableExpr::Derived {
                subquery: Box::new(self.query(subquery)?),
                alias: alias.as_ref().map(|a| self.ident(&a.name)),
            }),
            sp::TableFactor::NestedJoin {
                table_with_joins,
                alias: None,
                ..
            } => self.table_with_joins(table_with_joins),
            _ => Ok(TableExpr::Table(self.table_factor_ref(factor)?)),
        }
    }

    fn join_constraint(&mut self, constraint: &sp::JoinConstraint) -> Result<JoinConstraint> {
        Ok(match constraint {
            sp::JoinConstraint::On(expr) => JoinConstraint::On(self.cond(expr)?),
            sp::JoinConstraint::Using(names) => JoinConstraint::Using(
                names
                    .iter()
                    .map(|name| self.column(name).map(|c| c.name))
                    .try_collect()?,
            ),
            sp::JoinConstraint::Natural => JoinConstraint::Natural,
            sp::JoinConstraint::None => JoinConstraint::None,
        })
    }

    fn insert(&mut self, insert: &sp::Insert) -> Result<Insert> {
        let sp::TableObject::TableName(name) = &insert.table else {
            return unsupported("INSERT into a table function");
        };
        let table = self.table_ref(name, None)?;

        // an empty column list is filled in from metadata, if there is any
        let columns: Vec<ColumnRef> = (insert.columns.iter().enumerate())
            .map(|(i, column)| ColumnRef {
                qualifier: (self.pre.insert_column_qualifiers.get(i))
                    .and_then(Option::as_ref)
                    .map(|q| self.ident(q)),
                name: self.ident(column),
            })
            .collect();

        let Some(source) = &insert.source else {
            return unsupported("INSERT without VALUES");
        };
        let sp::SetExpr::Values(values) = source.body.as_ref() else {
            return unsupported("INSERT ... SELECT");
        };
        let rows: Vec<Vec<Expr>> = (values.rows.iter())
            .map(|row| {
                if !columns.is_empty() && row.len() != columns.len() {
                    return Err(Error::new_unsupported(format!(
                        "INSERT has {} columns but {} values",
                        columns.len(),
                        row.len()
                    )));
                }
                row.iter().map(|e| self.expr(e)).try_collect()
            })
            .try_collect()?;

        let mut upsert = (insert.ignore || self.pre.duplicate_key_ignore).then(Upsert::default);
        match &insert.on {
            None => {}
            Some(sp::OnInsert::DuplicateKeyUpdate(assignments)) => {
                upsert = Some(Upsert {
                    merge_keys: Vec::new(),
                    on_match: self.upsert_assignments(assignments)?,
                });
            }
            Some(sp::OnInsert::OnConflict(conflict)) => {
                let merge_keys = match &conflict.conflict_target {
                    None => Vec::new(),
                    Some(sp::ConflictTarget::Columns(columns)) => {
                        columns.iter().map(|c| self.ident(c)).collect()
                    }
                    Some(other) => return unsupported(other),
                };
                let on_match = match &conflict.action {
                    sp::OnConflictAction::DoNothing => Vec::new(),
                    sp::OnConflictAction::DoUpdate(update) => {
                        if update.selection.is_some() {
                            return unsupported("ON CONFLICT DO UPDATE ... WHERE");
                        }
                        self.upsert_assignments(&update.assignments)?
                    }
                };
                upsert = Some(Upsert {
                    merge_keys,
                    on_match,
                });
            }
            Some(other) => return unsupported(other),
        }

        let returning = match &insert.returning {
            Some(items) => items.iter().map(|i| self.select_item(i)).try_collect()?,
            None => Vec::new(),
        };

        Ok(Insert {
            table,
            columns,
            rows,
            upsert,
            returning,
        })
    }

    fn upsert_assignments(&mut self, assignments: &[sp::Assignment]) -> Result<Vec<Assignment>> {
        self.in_upsert = true;
        let result = self.assignments(assignments);
        self.in_upsert = false;
        result
    }

    fn delete(&mut self, delete: &sp::Delete) -> Result<Delete> {
        let (sp::FromTable::WithFromKeyword(tables) | sp::FromTable::WithoutKeyword(tables)) =
            &delete.from;

        let [table] = tables.as_slice() else {
            return unsupported("DELETE from more than one table");
        };
        if !delete.tables.is_empty() || delete.using.is_some() || !table.joins.is_empty() {
            return unsupported("DELETE from more than one table");
        }

        Ok(Delete {
            table: self.table_factor_ref(&table.relation)?,
            selection: delete.selection.as_ref().map(|e| self.cond(e)).transpose()?,
        })
    }

    /// Converts an expression in a boolean position.
    pub fn cond(&mut self, expr: &sp::Expr) -> Result<Cond> {
        use sp::BinaryOperator as Op;

        Ok(match expr {
            sp::Expr::Nested(inner) => self.cond(inner)?,
            sp::Expr::Value(value) if matches!(value.value, sp::Value::Boolean(_)) => {
                Cond::Literal(value.value == sp::Value::Boolean(true))
            }

            sp::Expr::BinaryOp { left, op, right } if is_boolean_operator(op) => match op {
                Op::And => Cond::And(Box::new(self.cond(left)?), Box::new(self.cond(right)?)),
                Op::Or => Cond::Or(Box::new(self.cond(left)?), Box::new(self.cond(right)?)),
                Op::Xor => Cond::Xor(Box::new(self.cond(left)?), Box::new(self.cond(right)?)),
                Op::PGRegexMatch | Op::PGRegexNotMatch => Cond::RegexMatch {
                    expr: self.expr(left)?,
                    pattern: self.expr(right)?,
                    negated: *op == Op::PGRegexNotMatch,
                },
                _ => Cond::Compare {
                    left: self.expr(left)?,
                    op: compare_op(op)?,
                    right: self.expr(right)?,
                },
            },
            sp::Expr::UnaryOp {
                op: sp::UnaryOperator::Not,
                expr,
            } => Cond::Not(Box::new(self.cond(expr)?)),

            sp::Expr::IsNull(inner) => Cond::IsNull {
                expr: self.expr(inner)?,
                negated: false,
            },
            sp::Expr::IsNotNull(inner) => Cond::IsNull {
                expr: self.expr(inner)?,
                negated: true,
            },
            sp::Expr::IsTrue(inner) => self.is_boolean(inner, true)?,
            sp::Expr::IsFalse(inner) => self.is_boolean(inner, false)?,
            sp::Expr::InList {
                expr,
                list,
                negated,
            } => Cond::InList {
                expr: self.expr(expr)?,
                list: list.iter().map(|e| self.expr(e)).try_collect()?,
                negated: *negated,
            },
            sp::Expr::Between {
                expr,
                negated,
                low,
                high,
            } => Cond::Between {
                symmetric: self.is_symmetric(low),
                expr: self.expr(expr)?,
                low: self.expr(low)?,
                high: self.expr(high)?,
                negated: *negated,
            },
            sp::Expr::Like {
                negated,
                expr,
                pattern,
                escape_char,
                ..
            } => self.like(expr, pattern, *negated, escape_char.is_some(), false)?,
            sp::Expr::ILike {
                negated,
                expr,
                pattern,
                escape_char,
                ..
            } => self.like(expr, pattern, *negated, escape_char.is_some(), true)?,
            sp::Expr::RLike {
                negated,
                expr,
                pattern,
                ..
            } => Cond::RegexMatch {
                expr: self.expr(expr)?,
                pattern: self.expr(pattern)?,
                negated: *negated,
            },

            _ => Cond::Expr(self.expr(expr)?),
        })
    }

    fn is_boolean(&mut self, expr: &sp::Expr, value: bool) -> Result<Cond> {
        Ok(Cond::Compare {
            left: self.expr(expr)?,
            op: CompareOp::Eq,
            right: Expr::Literal(Literal::Boolean(value)),
        })
    }

    fn like(
        &mut self,
        expr: &sp::Expr,
        pattern: &sp::Expr,
        negated: bool,
        has_escape: bool,
        case_insensitive: bool,
    ) -> Result<Cond> {
        if has_escape {
            return unsupported("LIKE ... ESCAPE");
        }
        Ok(Cond::Like {
            expr: self.expr(expr)?,
            pattern: self.expr(pattern)?,
            negated,
            case_insensitive,
        })
    }

    fn is_symmetric(&self, low: &sp::Expr) -> bool {
        let low_start = position(low.span().start);
        (self.pre.betweens.iter())
            .take_while(|(start, _)| *start < low_start)
            .last()
            .is_some_and(|(_, symmetric)| *symmetric)
    }

    pub fn expr(&mut self, expr: &sp::Expr) -> Result<Expr> {
        use sp::BinaryOperator as Op;

        Ok(match expr {
            sp::Expr::Identifier(ident) => match self.prefixed_param(ident) {
                Some(name) => Expr::Param(named_or_indexed(name)),
                None => Expr::Column(ColumnRef::bare(self.ident(ident))),
            },
            sp::Expr::CompoundIdentifier(parts) => match parts.as_slice() {
                [.., qualifier, column]
                    if self.in_upsert && qualifier.value.eq_ignore_ascii_case("excluded") =>
                {
                    Expr::Excluded(self.ident(column))
                }
                [.., qualifier, column] => Expr::Column(ColumnRef {
                    qualifier: Some(self.ident(qualifier)),
                    name: self.ident(column),
                }),
                _ => return unsupported(expr),
            },
            sp::Expr::Value(value) => self.value(&value.value)?,
            sp::Expr::Nested(inner) => self.expr(inner)?,
            sp::Expr::Tuple(items) => Expr::Tuple(items.iter().map(|e| self.expr(e)).try_collect()?),
            sp::Expr::Wildcard(_) => Expr::Wildcard,

            sp::Expr::BinaryOp { left, op, right } if !is_boolean_operator(op) => {
                let op = match op {
                    Op::Plus => BinOp::Add,
                    Op::Minus => BinOp::Sub,
                    Op::Multiply => BinOp::Mul,
                    Op::Divide => BinOp::Div,
                    Op::Modulo => BinOp::Mod,
                    Op::StringConcat => BinOp::Concat,
                    other => return unsupported(other),
                };
                Expr::Binary {
                    left: Box::new(self.expr(left)?),
                    op,
                    right: Box::new(self.expr(right)?),
                }
            }

            sp::Expr::UnaryOp {
                op: sp::UnaryOperator::Minus,
                expr: operand,
            } => match operand.as_ref() {
                sp::Expr::Value(v) => match &v.value {
                    sp::Value::Number(n, _) => Expr::Literal(Literal::Number(format!("-{n}"))),
                    _ => Expr::Negate(Box::new(self.expr(operand)?)),
                },
                _ => Expr::Negate(Box::new(self.expr(operand)?)),
            },
            sp::Expr::UnaryOp {
                op: sp::UnaryOperator::Plus,
                expr: operand,
            } => self.expr(operand)?,

            sp::Expr::BinaryOp { .. }
            | sp::Expr::UnaryOp {
                op: sp::UnaryOperator::Not,
                ..
            }
            | sp::Expr::IsNull(_)
            | sp::Expr::IsNotNull(_)
            | sp::Expr::IsTrue(_)
            | sp::Expr::IsFalse(_)
            | sp::Expr::InList { .. }
            | sp::Expr::Between { .. }
            | sp::Expr::Like { .. }
            | sp::Expr::ILike { .. }
            | sp::Expr::RLike { .. } => Expr::Condition(Box::new(self.cond(expr)?)),

            sp::Expr::Function(function) => self.function(function)?,

            sp::Expr::Case {
                operand,
                conditions,
                else_result,
                ..
            } => {
                let default = match else_result {
                    Some(e) => Some(Box::new(self.expr(e)?)),
                    None => None,
                };
                match operand {
                    Some(operand) => Expr::SimpleCase {
                        operand: Box::new(self.expr(operand)?),
                        branches: (conditions.iter())
                            .map(|w| Ok((self.expr(&w.condition)?, self.expr(&w.result)?)))
                            .collect::<Result<_>>()?,
                        default,
                    },
                    None => Expr::SearchedCase {
                        branches: (conditions.iter())
                            .map(|w| Ok((self.cond(&w.condition)?, self.expr(&w.result)?)))
                            .collect::<Result<_>>()?,
                        default,
                    },
                }
            }

            sp::Expr::Cast {
                expr: inner,
                data_type,
                ..
            } => Expr::Cast {
                expr: Box::new(self.expr(inner)?),
                target: cast_target(data_type),
            },

            sp::Expr::Extract {
                field, expr: inner, ..
            } => Expr::Extract {
                unit: field.to_string().to_uppercase(),
                expr: Box::new(self.expr(inner)?),
            },

            sp::Expr::Ceil { expr: inner, .. } => self.builtin("CEIL", inner)?,
            sp::Expr::Floor { expr: inner, .. } => self.builtin("FLOOR", inner)?,

            sp::Expr::Substring {
                expr: inner,
                substring_from,
                substring_for,
                ..
            } => Expr::Substring {
                expr: Box::new(self.expr(inner)?),
                from: self.boxed(substring_from.as_deref())?,
                length: self.boxed(substring_for.as_deref())?,
            },

            sp::Expr::Trim {
                expr: inner,
                trim_where,
                trim_what,
                trim_characters,
                ..
            } => {
                if trim_characters.is_some() {
                    return unsupported(expr);
                }
                Expr::Trim {
                    expr: Box::new(self.expr(inner)?),
                    side: match trim_where {
                        Some(sp::TrimWhereField::Leading) => TrimSide::Leading,
                        Some(sp::TrimWhereField::Trailing) => TrimSide::Trailing,
                        Some(sp::TrimWhereField::Both) | None => TrimSide::Both,
                    },
                    characters: self.boxed(trim_what.as_deref())?,
                }
            }

            other => return unsupported(other),
        })
    }

    fn boxed(&mut self, expr: Option<&sp::Expr>) -> Result<Option<Box<Expr>>> {
        expr.map(|e| self.expr(e).map(Box::new)).transpose()
    }

    fn builtin(&mut self, name: &str, arg: &sp::Expr) -> Result<Expr> {
        Ok(Expr::Function(FunctionCall {
            name: name.to_string(),
            distinct: false,
            args: vec![self.expr(arg)?],
        }))
    }

    fn function(&mut self, function: &sp::Function) -> Result<Expr> {
        if function.over.is_some() || function.filter.is_some() {
            return unsupported(function);
        }
        let Some(name) = function.name.0.last().and_then(|p| p.as_ident()) else {
            return unsupported(function);
        };

        let (distinct, args) = match &function.args {
            sp::FunctionArguments::None => (false, Vec::new()),
            sp::FunctionArguments::Subquery(_) => return unsupported(function),
            sp::FunctionArguments::List(list) => (
                matches!(
                    list.duplicate_treatment,
                    Some(sp::DuplicateTreatment::Distinct)
                ),
                list.args
                    .iter()
                    .map(|arg| self.function_arg(arg))
                    .try_collect()?,
            ),
        };

        if self.in_upsert && name.value.eq_ignore_ascii_case("VALUES") {
            if let [Expr::Column(column)] = args.as_slice() {
                return Ok(Expr::Excluded(column.name.clone()));
            }
        }

        Ok(Expr::Function(FunctionCall {
            name: name.value.clone(),
            distinct,
            args,
        }))
    }

    fn function_arg(&mut self, arg: &sp::FunctionArg) -> Result<Expr> {
        match arg {
            sp::FunctionArg::Unnamed(sp::FunctionArgExpr::Expr(expr)) => self.expr(expr),
            sp::FunctionArg::Unnamed(sp::FunctionArgExpr::Wildcard) => Ok(Expr::Wildcard),
            other => unsupported(other),
        }
    }

    fn value(&self, value: &sp::Value) -> Result<Expr> {
        Ok(Expr::Literal(match value {
            sp::Value::Null => Literal::Null,
            sp::Value::Boolean(b) => Literal::Boolean(*b),
            sp::Value::Number(n, _) => Literal::Number(n.to_string()),
            sp::Value::SingleQuotedString(s)
            | sp::Value::EscapedStringLiteral(s)
            | sp::Value::NationalStringLiteral(s)
            | sp::Value::DoubleQuotedString(s) => Literal::String(s.clone()),
            sp::Value::Placeholder(raw) => return self.placeholder(raw).map(Expr::Param),
            other => return unsupported(other),
        }))
    }

    fn named_prefix(&self) -> Option<&str> {
        (self.options.named_param_prefix.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Identifiers such as `#name` when `#` is the configured parameter prefix.
    fn prefixed_param<'i>(&self, ident: &'i sp::Ident) -> Option<&'i str> {
        if ident.quote_style.is_some() {
            return None;
        }
        let name = ident.value.strip_prefix(self.named_prefix()?)?;
        (!name.is_empty()).then_some(name)
    }

    fn placeholder(&self, raw: &str) -> Result<Param> {
        if raw == "?" {
            return Ok(Param::Anonymous);
        }
        let named = (self.named_prefix().and_then(|p| raw.strip_prefix(p)))
            .or_else(|| raw.strip_prefix(':'))
            .filter(|name| !name.is_empty());
        if let Some(name) = named {
            return Ok(named_or_indexed(name));
        }
        if let Some(index) = raw.strip_prefix('$').and_then(|i| i.parse().ok()) {
            return Ok(Param::Indexed(index));
        }

        Err(Error::new_unsupported(format!(
            "Unsupported parameter placeholder: {raw}"
        )))
        .push_hint("use `?`, `:name` or `$1`, or configure a named parameter prefix")
    }
}

fn named_or_indexed(name: &str) -> Param {
    match name.parse::<usize>() {
        Ok(index) => Param::Indexed(index),
        Err(_) => Param::Named(name.to_string()),
    }
}

fn is_boolean_operator(op: &sp::BinaryOperator) -> bool {
    use sp::BinaryOperator as Op;
    matches!(
        op,
        Op::And
            | Op::Or
            | Op::Xor
            | Op::Eq
            | Op::NotEq
            | Op::Lt
            | Op::LtEq
            | Op::Gt
            | Op::GtEq
            | Op::PGRegexMatch
            | Op::PGRegexNotMatch
    )
}

fn compare_op(op: &sp::BinaryOperator) -> Result<CompareOp> {
    use sp::BinaryOperator as Op;
    Ok(match op {
        Op::Eq => CompareOp::Eq,
        Op::NotEq => CompareOp::NotEq,
        Op::Lt => CompareOp::Lt,
        Op::LtEq => CompareOp::LtEq,
        Op::Gt => CompareOp::Gt,
        Op::GtEq => CompareOp::GtEq,
        other => return unsupported(other),
    })
}

fn cast_target(data_type: &sp::DataType) -> CastTarget {
    let written = data_type.to_string().to_uppercase();
    let base = written.split('(').next().unwrap_or_default().trim();

    match base {
        "CHAR" | "CHARACTER" | "VARCHAR" | "CHARACTER VARYING" | "NCHAR" | "NVARCHAR" | "TEXT"
        | "STRING" | "CLOB" | "LONGTEXT" => CastTarget::String,
        "BOOLEAN" | "BOOL" => CastTarget::Boolean,
        "FLOAT" | "FLOAT4" | "FLOAT8" | "FLOAT64" | "DOUBLE" | "DOUBLE PRECISION" | "REAL"
        | "DECIMAL" | "DEC" | "NUMERIC" => CastTarget::Float,
        "INT" | "INTEGER" | "BIGINT" | "SMALLINT" | "TINYINT" | "MEDIUMINT" | "INT2" | "INT4"
        | "INT8" | "INT64" | "SIGNED" | "UNSIGNED" => CastTarget::Integer,
        _ => CastTarget::Other(written),
    }
}
