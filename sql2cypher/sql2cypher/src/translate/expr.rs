use itertools::Itertools;

use crate::ast::{self, BinOp as SqlBinOp, CastTarget, CompareOp, Cond, FunctionCall, Param, TrimSide};
use crate::ir::cypher::{BinOp, Expr, Literal, UnOp};
use crate::{Error, Result};

use super::{unsupported, Context, Unresolved};

pub(super) fn translate_expr(expr: &ast::Expr, ctx: &mut Context) -> Result<Expr> {
    use ast::Expr as E;

    Ok(match expr {
        E::Column(column) => ctx.resolve_column(column)?,
        E::Literal(literal) => Expr::Literal(translate_literal(literal)),
        E::Param(param) => Expr::Parameter(match param {
            Param::Anonymous => ctx.params.new_index(),
            Param::Named(name) => ctx.params.named(name),
            Param::Indexed(index) => ctx.params.indexed(*index),
        }),

        E::Binary { left, op, right } => {
            let left = translate_expr(left, ctx)?;
            let right = translate_expr(right, ctx)?;
            let op = match op {
                SqlBinOp::Add | SqlBinOp::Concat => BinOp::Add,
                SqlBinOp::Sub => BinOp::Sub,
                SqlBinOp::Mul => BinOp::Mul,
                SqlBinOp::Div => BinOp::Div,
                SqlBinOp::Mod => BinOp::Mod,
            };
            Expr::binary(left, op, right)
        }
        E::Negate(_) => return unsupported("NEG"),

        E::Function(function) => translate_function(function, ctx)?,

        E::SimpleCase {
            operand,
            branches,
            default,
        } => {
            let operand = translate_expr(operand, ctx)?;
            let branches = (branches.iter())
                .map(|(when, then)| -> Result<_> {
                    Ok((translate_expr(when, ctx)?, translate_expr(then, ctx)?))
                })
                .collect::<Result<_>>()?;
            Expr::Case {
                operand: Some(Box::new(operand)),
                branches,
                default: translate_default(default, ctx)?,
            }
        }
        E::SearchedCase { branches, default } => {
            let branches = (branches.iter())
                .map(|(when, then)| -> Result<_> {
                    Ok((translate_cond(when, ctx)?, translate_expr(then, ctx)?))
                })
                .collect::<Result<_>>()?;
            Expr::Case {
                operand: None,
                branches,
                default: translate_default(default, ctx)?,
            }
        }

        E::Cast { expr, target } => {
            let function = match target {
                CastTarget::String => "toString",
                CastTarget::Boolean => "toBoolean",
                CastTarget::Float => "toFloat",
                CastTarget::Integer => "toInteger",
                CastTarget::Other(data_type) => return unsupported(format!("CAST to {data_type}")),
            };
            Expr::call(function, vec![translate_expr(expr, ctx)?])
        }
        E::Extract { unit, expr } => date_part(unit, translate_expr(expr, ctx)?)?,

        E::Substring { expr, from, length } => {
            let Some(from) = from else {
                return unsupported("SUBSTRING without a start position");
            };
            let mut args = vec![translate_expr(expr, ctx)?, translate_expr(from, ctx)?];
            if let Some(length) = length {
                args.push(translate_expr(length, ctx)?);
            }
            Expr::call("substring", args)
        }
        E::Trim {
            expr,
            side,
            characters,
        } => {
            if characters.is_some() {
                return unsupported("TRIM of specific characters");
            }
            let function = match side {
                TrimSide::Both => "trim",
                TrimSide::Leading => "ltrim",
                TrimSide::Trailing => "rtrim",
            };
            Expr::call(function, vec![translate_expr(expr, ctx)?])
        }

        E::Tuple(_) => return unsupported("row value outside of a comparison"),

        E::Excluded(column) => match ctx.excluded.get(column) {
            Some(value) => value.clone(),
            None => return unsupported(format!("EXCLUDED.{column}")),
        },

        E::Wildcard => Expr::Star,
        E::Condition(cond) => translate_cond(cond, ctx)?,
    })
}

fn translate_default(default: &Option<Box<ast::Expr>>, ctx: &mut Context) -> Result<Option<Box<Expr>>> {
    (default.as_deref())
        .map(|e| translate_expr(e, ctx).map(Box::new))
        .transpose()
}

fn translate_literal(literal: &ast::Literal) -> Literal {
    match literal {
        ast::Literal::Null => Literal::Null,
        ast::Literal::Boolean(b) => Literal::Boolean(*b),
        ast::Literal::Number(n) => Literal::Number(n.clone()),
        ast::Literal::String(s) => Literal::String(s.clone()),
    }
}

/// Function arguments may refer to variables that no table declares.
fn translate_args(args: &[ast::Expr], ctx: &mut Context) -> Result<Vec<Expr>> {
    ctx.with_unresolved(Unresolved::AsVariable, |ctx| {
        args.iter().map(|arg| translate_expr(arg, ctx)).collect()
    })
}

/// SQL aggregate to Cypher aggregate.
const AGGREGATES: &[(&str, &str)] = &[
    ("COUNT", "count"),
    ("MIN", "min"),
    ("MAX", "max"),
    ("SUM", "sum"),
    ("AVG", "avg"),
    ("PERCENTILE_CONT", "percentileCont"),
    ("PERCENTILECONT", "percentileCont"),
    ("PERCENTILE_DISC", "percentileDisc"),
    ("PERCENTILEDISC", "percentileDisc"),
    ("STDDEV", "stDev"),
    ("STDDEV_SAMP", "stDev"),
    ("STDEV", "stDev"),
    ("STDDEV_POP", "stDevP"),
    ("STDEVP", "stDevP"),
];

/// Functions that only differ in name.
const RENAMED_FUNCTIONS: &[(&str, &str)] = &[
    ("ABS", "abs"),
    ("CEIL", "ceil"),
    ("CEILING", "ceil"),
    ("FLOOR", "floor"),
    ("ROUND", "round"),
    ("SIGN", "sign"),
    ("SQRT", "sqrt"),
    ("EXP", "exp"),
    ("LN", "log"),
    ("LOG", "log"),
    ("LOG10", "log10"),
    ("ACOS", "acos"),
    ("ASIN", "asin"),
    ("ATAN", "atan"),
    ("ATAN2", "atan2"),
    ("COS", "cos"),
    ("COT", "cot"),
    ("SIN", "sin"),
    ("TAN", "tan"),
    ("RADIANS", "radians"),
    ("DEGREES", "degrees"),
    ("PI", "pi"),
    ("RAND", "rand"),
    ("RANDOM", "rand"),
    ("E", "e"),
    ("CHAR_LENGTH", "size"),
    ("CHARACTER_LENGTH", "size"),
    ("LENGTH", "size"),
    ("LOWER", "toLower"),
    ("LCASE", "toLower"),
    ("UPPER", "toUpper"),
    ("UCASE", "toUpper"),
    ("LEFT", "left"),
    ("RIGHT", "right"),
    ("LTRIM", "ltrim"),
    ("RTRIM", "rtrim"),
    ("TRIM", "trim"),
    ("REPLACE", "replace"),
    ("REVERSE", "reverse"),
    ("SUBSTRING", "substring"),
    ("SUBSTR", "substring"),
    ("COALESCE", "coalesce"),
    ("NVL", "coalesce"),
    ("IFNULL", "coalesce"),
];

fn lookup(table: &[(&str, &'static str)], name: &str) -> Option<&'static str> {
    (table.iter())
        .find(|(sql, _)| sql.eq_ignore_ascii_case(name))
        .map(|(_, cypher)| *cypher)
}

fn translate_function(function: &FunctionCall, ctx: &mut Context) -> Result<Expr> {
    let name = function.name.to_uppercase();

    if let Some(aggregate) = lookup(AGGREGATES, &name) {
        if aggregate == "count" && matches!(function.args.as_slice(), [ast::Expr::Wildcard]) {
            return Ok(Expr::CountStar);
        }
        return Ok(Expr::FunctionCall {
            name: aggregate.to_string(),
            distinct: function.distinct,
            args: translate_args(&function.args, ctx)?,
        });
    }

    if let Some(unit) = date_part_function(&name) {
        let [arg] = arity::<1>(&function.name, translate_args(&function.args, ctx)?)?;
        return date_part(unit, arg);
    }

    let args = translate_args(&function.args, ctx)?;
    Ok(match name.as_str() {
        "LOG" if args.len() == 2 => {
            let [base, value] = arity::<2>(&function.name, args)?;
            Expr::binary(
                Expr::call("log", vec![value]),
                BinOp::Div,
                Expr::call("log", vec![base]),
            )
        }
        "POWER" | "POW" => {
            let [base, exponent] = arity::<2>(&function.name, args)?;
            Expr::binary(base, BinOp::Pow, exponent)
        }
        "SQUARE" => {
            let [value] = arity::<1>(&function.name, args)?;
            Expr::binary(value.clone(), BinOp::Mul, value)
        }
        "CONCAT" => (args.into_iter())
            .rev()
            .reduce(|right, left| Expr::binary(left, BinOp::Add, right))
            .map_or_else(|| unsupported("CONCAT without arguments"), Ok)?,
        "NULLIF" => {
            let [value, other] = arity::<2>(&function.name, args)?;
            Expr::Case {
                operand: None,
                branches: vec![(Expr::binary(value.clone(), BinOp::Eq, other), Expr::null())],
                default: Some(Box::new(value)),
            }
        }
        "NVL2" => {
            let [value, if_not_null, if_null] = arity::<3>(&function.name, args)?;
            Expr::Case {
                operand: None,
                branches: vec![(Expr::unary(UnOp::IsNotNull, value), if_not_null)],
                default: Some(Box::new(if_null)),
            }
        }
        _ => match lookup(RENAMED_FUNCTIONS, &name) {
            Some(cypher) => Expr::call(cypher, args),
            None => Expr::FunctionCall {
                name: function.name.clone(),
                distinct: function.distinct,
                args,
            },
        },
    })
}

fn arity<const N: usize>(function: &str, args: Vec<Expr>) -> Result<[Expr; N]> {
    <[Expr; N]>::try_from(args).or_else(|args| {
        unsupported(format!(
            "{function} with {} arguments, expected {N}",
            args.len()
        ))
    })
}

fn date_part_function(name: &str) -> Option<&'static str> {
    Some(match name {
        "YEAR" => "year",
        "QUARTER" => "quarter",
        "MONTH" => "month",
        "WEEK" => "week",
        "DAY" | "DAYOFMONTH" => "day",
        "DAYOFWEEK" => "dayOfWeek",
        "DAYOFYEAR" => "ordinalDay",
        "HOUR" => "hour",
        "MINUTE" => "minute",
        "SECOND" => "second",
        _ => return None,
    })
}

/// `EXTRACT(unit FROM value)` as a property of the temporal value.
fn date_part(unit: &str, value: Expr) -> Result<Expr> {
    let accessor = match unit.to_uppercase().as_str() {
        "YEAR" | "YEARS" => "year",
        "QUARTER" => "quarter",
        "MONTH" | "MONTHS" => "month",
        "WEEK" | "WEEKS" => "week",
        "DAY" | "DAYS" => "day",
        "DOW" | "DAYOFWEEK" => "dayOfWeek",
        "DOY" | "DAYOFYEAR" => "ordinalDay",
        "HOUR" | "HOURS" => "hour",
        "MINUTE" | "MINUTES" => "minute",
        "SECOND" | "SECONDS" => "second",
        "MILLISECOND" | "MILLISECONDS" => "millisecond",
        "MICROSECOND" | "MICROSECONDS" => "microsecond",
        "NANOSECOND" | "NANOSECONDS" => "nanosecond",
        "EPOCH" => "epochSeconds",
        other => {
            return Err(Error::new_unsupported(format!(
                "Unsupported value for date/time extraction: {other}"
            )))
        }
    };
    Ok(value.property(accessor))
}

pub(super) fn translate_cond(cond: &Cond, ctx: &mut Context) -> Result<Expr> {
    Ok(match cond {
        Cond::And(left, right) => translate_cond(left, ctx)?.and(translate_cond(right, ctx)?),
        Cond::Or(left, right) => translate_cond(left, ctx)?.or(translate_cond(right, ctx)?),
        Cond::Xor(left, right) => {
            let left = translate_cond(left, ctx)?;
            Expr::binary(left, BinOp::Xor, translate_cond(right, ctx)?)
        }
        Cond::Not(inner) => translate_cond(inner, ctx)?.not(),

        Cond::Compare { left, op, right } => match (left, right) {
            (ast::Expr::Tuple(left), ast::Expr::Tuple(right)) => {
                translate_row_comparison(left, *op, right, ctx)?
            }
            _ => {
                let left = translate_expr(left, ctx)?;
                Expr::binary(left, compare_op(*op), translate_expr(right, ctx)?)
            }
        },

        Cond::IsNull { expr, negated } => {
            let op = if *negated { UnOp::IsNotNull } else { UnOp::IsNull };
            match expr {
                ast::Expr::Tuple(items) => {
                    let checks: Vec<Expr> = (items.iter())
                        .map(|item| translate_expr(item, ctx).map(|e| Expr::unary(op, e)))
                        .try_collect()?;
                    (checks.into_iter())
                        .reduce(Expr::and)
                        .map_or_else(|| unsupported("empty row value"), Ok)?
                }
                _ => Expr::unary(op, translate_expr(expr, ctx)?),
            }
        }

        Cond::InList {
            expr,
            list,
            negated,
        } => {
            let expr = translate_expr(expr, ctx)?;
            let list = (list.iter())
                .map(|item| translate_expr(item, ctx))
                .collect::<Result<_>>()?;
            negate(Expr::binary(expr, BinOp::In, Expr::List(list)), *negated)
        }

        Cond::Between {
            expr,
            low,
            high,
            negated,
            symmetric,
        } => {
            let expr = translate_expr(expr, ctx)?;
            let low = translate_expr(low, ctx)?;
            let high = translate_expr(high, ctx)?;

            let between = |low: &Expr, high: &Expr| {
                Expr::binary(low.clone(), BinOp::Lte, expr.clone())
                    .and(Expr::binary(expr.clone(), BinOp::Lte, high.clone()))
            };
            let mut result = between(&low, &high);
            if *symmetric {
                result = result.or(between(&high, &low));
            }
            negate(result, *negated)
        }

        Cond::Like {
            expr,
            pattern,
            negated,
            case_insensitive,
        } => negate(translate_like(expr, pattern, *case_insensitive, ctx)?, *negated),

        Cond::RegexMatch {
            expr,
            pattern,
            negated,
        } => {
            let expr = translate_expr(expr, ctx)?;
            let pattern = translate_expr(pattern, ctx)?;
            negate(Expr::binary(expr, BinOp::RegexMatch, pattern), *negated)
        }

        Cond::Literal(value) => Expr::Literal(Literal::Boolean(*value)),
        Cond::Expr(expr) => translate_expr(expr, ctx)?,
    })
}

fn negate(expr: Expr, negated: bool) -> Expr {
    if negated {
        expr.not()
    } else {
        expr
    }
}

fn compare_op(op: CompareOp) -> BinOp {
    match op {
        CompareOp::Eq => BinOp::Eq,
        CompareOp::NotEq => BinOp::Ne,
        CompareOp::Lt => BinOp::Lt,
        CompareOp::LtEq => BinOp::Lte,
        CompareOp::Gt => BinOp::Gt,
        CompareOp::GtEq => BinOp::Gte,
    }
}

/// `(a, b) < (c, d)` becomes `a < c OR (a = c AND b < d)`; equality and
/// inequality compare column by column.
fn translate_row_comparison(
    left: &[ast::Expr],
    op: CompareOp,
    right: &[ast::Expr],
    ctx: &mut Context,
) -> Result<Expr> {
    if left.len() != right.len() || left.is_empty() {
        return unsupported(format!(
            "comparison of rows of degree {} and {}",
            left.len(),
            right.len()
        ));
    }

    let left: Vec<Expr> = (left.iter()).map(|e| translate_expr(e, ctx)).try_collect()?;
    let right: Vec<Expr> = (right.iter()).map(|e| translate_expr(e, ctx)).try_collect()?;
    let mut pairs = left.into_iter().zip(right).rev();

    let Some((last_left, last_right)) = pairs.next() else {
        return Err(Error::new_assert("empty row comparison"));
    };
    let mut result = Expr::binary(last_left, compare_op(op), last_right);

    for (l, r) in pairs {
        result = if op.is_ordering() {
            let strict = Expr::binary(l.clone(), compare_op(op.strict()), r.clone());
            strict.or(Expr::binary(l, BinOp::Eq, r).and(result))
        } else {
            Expr::binary(l, compare_op(op), r).and(result)
        };
    }
    Ok(result)
}

fn translate_like(
    expr: &ast::Expr,
    pattern: &ast::Expr,
    case_insensitive: bool,
    ctx: &mut Context,
) -> Result<Expr> {
    let subject = translate_expr(expr, ctx)?;

    let ast::Expr::Literal(ast::Literal::String(pattern)) = pattern else {
        let mut pattern = translate_expr(pattern, ctx)?;
        if case_insensitive {
            pattern = Expr::binary(Expr::string("(?i)"), BinOp::Add, pattern);
        }
        return Ok(Expr::binary(subject, BinOp::RegexMatch, pattern));
    };

    if !case_insensitive {
        if let Some((op, needle)) = simple_like(pattern) {
            return Ok(Expr::binary(subject, op, Expr::string(needle)));
        }
    }

    let mut regex = like_to_regex(pattern);
    if case_insensitive {
        regex.insert_str(0, "(?i)");
    }
    Ok(Expr::binary(subject, BinOp::RegexMatch, Expr::string(regex)))
}

/// `%x%`, `%x` and `x%`, where `x` holds no wildcards.
fn simple_like(pattern: &str) -> Option<(BinOp, &str)> {
    let is_plain = |s: &str| !s.is_empty() && !s.contains(['%', '_']);

    if let Some(inner) = pattern.strip_prefix('%').and_then(|p| p.strip_suffix('%')) {
        if is_plain(inner) {
            return Some((BinOp::Contains, inner));
        }
    }
    if let Some(suffix) = pattern.strip_prefix('%') {
        if is_plain(suffix) {
            return Some((BinOp::EndsWith, suffix));
        }
    }
    if let Some(prefix) = pattern.strip_suffix('%') {
        if is_plain(prefix) {
            return Some((BinOp::StartsWith, prefix));
        }
    }
    None
}

fn like_to_regex(pattern: &str) -> String {
    let mut regex = String::new();
    let mut literal = String::new();

    for c in pattern.chars().dedup_by(|a, b| *a == '%' && *b == '%') {
        match c {
            '%' | '_' => {
                regex += &regex::escape(&literal);
                literal.clear();
                regex += if c == '%' { ".*" } else { "." };
            }
            c => literal.push(c),
        }
    }
    regex += &regex::escape(&literal);
    regex
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("%Keanu%", Some((BinOp::Contains, "Keanu")))]
    #[case("%Reeves", Some((BinOp::EndsWith, "Reeves")))]
    #[case("Keanu%", Some((BinOp::StartsWith, "Keanu")))]
    #[case("%%%", None)]
    #[case("%_%", None)]
    #[case("%", None)]
    #[case("Ke_nu%", None)]
    #[case("Keanu", None)]
    fn test_simple_like(#[case] pattern: &str, #[case] expected: Option<(BinOp, &str)>) {
        assert_eq!(simple_like(pattern), expected);
    }

    #[rstest]
    #[case("This is _ %Test%", "This is . .*Test.*")]
    #[case("%%%", ".*")]
    #[case("%_%", ".*..*")]
    #[case("%ein%schöner%Name%", ".*ein.*schöner.*Name.*")]
    #[case("a.b%", r"a\.b.*")]
    fn test_like_to_regex(#[case] pattern: &str, #[case] expected: &str) {
        assert_eq!(like_to_regex(pattern), expected);
    }

    #[test]
    fn test_date_part() {
        let value = Expr::var("o").property("OrderDate");
        assert_eq!(
            date_part("DOW", value.clone()).unwrap(),
            value.clone().property("dayOfWeek")
        );
        assert_eq!(
            date_part("EPOCH", value.clone()).unwrap(),
            value.clone().property("epochSeconds")
        );

        let err = date_part("CENTURY", value).unwrap_err();
        assert_eq!(
            err.to_string(),
            "[E0002] Error: Unsupported value for date/time extraction: CENTURY"
        );
    }
}
