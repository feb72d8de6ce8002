//! Renders the Cypher AST into text. The only place where Cypher is written.

use itertools::Itertools;

use crate::ir::cypher::*;
use crate::utils::is_valid_identifier;
use crate::{NameCase, Options};

pub fn render(statement: &Statement, opt: &WriteOpt) -> String {
    statement.write(opt)
}

#[derive(Debug, Clone, Default)]
pub struct WriteOpt {
    /// Put every clause on its own line.
    pub pretty: bool,

    /// Backtick labels and relationship types even when not needed.
    pub escape_names: bool,

    /// Applied to property names and map keys.
    pub name_case: NameCase,
}

impl From<&Options> for WriteOpt {
    fn from(options: &Options) -> Self {
        WriteOpt {
            pretty: options.pretty,
            escape_names: options.always_escape_names,
            name_case: options.render_name_case,
        }
    }
}

impl WriteOpt {
    fn clause_separator(&self) -> &'static str {
        if self.pretty {
            "\n"
        } else {
            " "
        }
    }

    fn label(&self, name: &str) -> String {
        if self.escape_names {
            escape(name)
        } else {
            write_ident(name)
        }
    }

    fn key(&self, name: &str) -> String {
        write_ident(&self.name_case.apply(name, false))
    }
}

pub trait WriteSource {
    fn write(&self, opt: &WriteOpt) -> String;

    fn write_between<S: ToString>(&self, prefix: S, suffix: &str, opt: &WriteOpt) -> String {
        let mut r = prefix.to_string();
        r += &self.write(opt);
        r += suffix;
        r
    }
}

pub struct SeparatedExprs<'a, T: WriteSource> {
    pub exprs: &'a [T],
    pub separator: &'static str,
}

impl<T: WriteSource> WriteSource for SeparatedExprs<'_, T> {
    fn write(&self, opt: &WriteOpt) -> String {
        self.exprs.iter().map(|e| e.write(opt)).join(self.separator)
    }
}

fn comma_separated<T: WriteSource>(exprs: &[T], opt: &WriteOpt) -> String {
    SeparatedExprs {
        exprs,
        separator: ", ",
    }
    .write(opt)
}

/// Writes a name, quoting it with backticks when it is not a valid identifier.
pub fn write_ident(name: &str) -> String {
    if is_valid_identifier(name) {
        name.to_string()
    } else {
        escape(name)
    }
}

fn escape(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

impl WriteSource for Statement {
    fn write(&self, opt: &WriteOpt) -> String {
        write_clauses(&self.clauses, opt)
    }
}

fn write_clauses(clauses: &[Clause], opt: &WriteOpt) -> String {
    clauses
        .iter()
        .map(|c| c.write(opt))
        .join(opt.clause_separator())
}

impl WriteSource for Clause {
    fn write(&self, opt: &WriteOpt) -> String {
        let sep = opt.clause_separator();

        match self {
            Clause::Match {
                patterns,
                predicate,
            } => {
                let mut r = comma_separated(patterns, opt);
                r.insert_str(0, "MATCH ");
                if let Some(predicate) = predicate {
                    r += sep;
                    r += "WHERE ";
                    r += &predicate.write(opt);
                }
                r
            }
            Clause::Create { patterns } => comma_separated(patterns, opt).write_prefixed("CREATE "),
            Clause::Merge {
                pattern,
                on_create,
                on_match,
            } => {
                let mut r = pattern.write_between("MERGE ", "", opt);
                if !on_create.is_empty() {
                    r += sep;
                    r += &comma_separated(on_create, opt).write_prefixed("ON CREATE SET ");
                }
                if !on_match.is_empty() {
                    r += sep;
                    r += &comma_separated(on_match, opt).write_prefixed("ON MATCH SET ");
                }
                r
            }
            Clause::Delete { targets, detach } => {
                let keyword = if *detach { "DETACH DELETE " } else { "DELETE " };
                comma_separated(targets, opt).write_prefixed(keyword)
            }
            Clause::Set { items } => comma_separated(items, opt).write_prefixed("SET "),
            Clause::With { items } => comma_separated(items, opt).write_prefixed("WITH "),
            Clause::Return(ret) => ret.write(opt),
            Clause::Unwind { list, alias, body } => {
                let mut r = format!("UNWIND {} AS {}", list.write(opt), write_ident(alias));
                if !body.is_empty() {
                    r += sep;
                    r += &write_clauses(body, opt);
                }
                r
            }
            Clause::Finish => "FINISH".to_string(),
        }
    }
}

trait Prefixed {
    fn write_prefixed(self, prefix: &str) -> String;
}

impl Prefixed for String {
    fn write_prefixed(mut self, prefix: &str) -> String {
        self.insert_str(0, prefix);
        self
    }
}

impl WriteSource for Return {
    fn write(&self, opt: &WriteOpt) -> String {
        let sep = opt.clause_separator();

        let mut r = String::from("RETURN ");
        if self.distinct {
            r += "DISTINCT ";
        }
        r += &comma_separated(&self.items, opt);

        if !self.order_by.is_empty() {
            r += sep;
            r += &comma_separated(&self.order_by, opt).write_prefixed("ORDER BY ");
        }
        if let Some(skip) = &self.skip {
            r += sep;
            r += &skip.write_between("SKIP ", "", opt);
        }
        if let Some(limit) = &self.limit {
            r += sep;
            r += &limit.write_between("LIMIT ", "", opt);
        }
        r
    }
}

impl WriteSource for ReturnItem {
    fn write(&self, opt: &WriteOpt) -> String {
        let mut r = self.expr.write(opt);
        if let Some(alias) = &self.alias {
            r += " AS ";
            r += &write_ident(alias);
        }
        r
    }
}

impl WriteSource for SortItem {
    fn write(&self, opt: &WriteOpt) -> String {
        let mut r = self.expr.write(opt);
        if let Some(direction) = &self.direction {
            r += " ";
            r += &direction.to_string();
        }
        r
    }
}

impl WriteSource for SetItem {
    fn write(&self, opt: &WriteOpt) -> String {
        format!("{} = {}", self.target.write(opt), self.value.write(opt))
    }
}

impl WriteSource for Pattern {
    fn write(&self, opt: &WriteOpt) -> String {
        let mut r = self.start.write(opt);
        for (rel, node) in &self.chain {
            r += &rel.write(opt);
            r += &node.write(opt);
        }
        r
    }
}

fn write_properties(properties: &[(String, Expr)], opt: &WriteOpt) -> String {
    if properties.is_empty() {
        return String::new();
    }
    format!(" {}", write_map(properties, opt))
}

fn write_map(entries: &[(String, Expr)], opt: &WriteOpt) -> String {
    let entries = entries
        .iter()
        .map(|(k, v)| format!("{}: {}", opt.key(k), v.write(opt)))
        .join(", ");
    format!("{{{entries}}}")
}

impl WriteSource for NodePattern {
    fn write(&self, opt: &WriteOpt) -> String {
        let mut r = String::from("(");
        if let Some(variable) = &self.variable {
            r += &write_ident(variable);
        }
        for label in &self.labels {
            r += ":";
            r += &opt.label(label);
        }
        r += &write_properties(&self.properties, opt);
        r += ")";
        r
    }
}

impl WriteSource for RelPattern {
    fn write(&self, opt: &WriteOpt) -> String {
        let mut details = String::new();
        if let Some(variable) = &self.variable {
            details += &write_ident(variable);
        }
        if let Some(rel_type) = &self.rel_type {
            details += ":";
            details += &opt.label(rel_type);
        }
        details += &write_properties(&self.properties, opt);

        let (left, right) = match self.direction {
            Direction::LeftToRight => ("-", "->"),
            Direction::RightToLeft => ("<-", "-"),
            Direction::Undirected => ("-", "-"),
        };
        if details.is_empty() {
            format!("{left}{right}")
        } else {
            format!("{left}[{details}]{right}")
        }
    }
}

impl WriteSource for Literal {
    fn write(&self, _: &WriteOpt) -> String {
        match self {
            Literal::Null => "NULL".to_string(),
            Literal::Boolean(b) => b.to_string(),
            Literal::Number(n) => n.clone(),
            Literal::String(s) => {
                format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
            }
        }
    }
}

impl WriteSource for Expr {
    fn write(&self, opt: &WriteOpt) -> String {
        match self {
            Expr::Literal(literal) => literal.write(opt),
            Expr::Parameter(name) => {
                if name.chars().all(|c| c.is_ascii_digit()) {
                    format!("${name}")
                } else {
                    format!("${}", write_ident(name))
                }
            }
            Expr::Variable(name) => write_ident(name),
            Expr::Property { subject, name } => {
                format!("{}.{}", subject.write(opt), opt.key(name))
            }
            Expr::DynamicProperty { subject, key } => {
                let key = match key.as_ref() {
                    Expr::Literal(Literal::String(k)) => {
                        Literal::String(opt.name_case.apply(k, false)).write(opt)
                    }
                    key => key.write(opt),
                };
                format!("{}[{key}]", subject.write(opt))
            }
            Expr::FunctionCall {
                name,
                distinct,
                args,
            } => {
                let distinct = if *distinct { "DISTINCT " } else { "" };
                format!("{name}({distinct}{})", comma_separated(args, opt))
            }
            Expr::CountStar => "count(*)".to_string(),
            Expr::Binary { op, .. } if op.is_logical() => {
                let operands = flatten_logical(self, *op);
                let inner = (operands.iter())
                    .map(|e| e.write(opt))
                    .join(&format!(" {op} "));
                format!("({inner})")
            }
            Expr::Binary { left, op, right } if op.is_arithmetic() => {
                format!("({} {op} {})", left.write(opt), right.write(opt))
            }
            Expr::Binary { left, op, right } => {
                format!("{} {op} {}", write_operand(left, opt), write_operand(right, opt))
            }
            Expr::Unary { op, expr } => match op {
                UnOp::Not if expr.is_logical() => format!("NOT {}", expr.write(opt)),
                UnOp::Not => expr.write_between("NOT (", ")", opt),
                UnOp::IsNull => format!("{} IS NULL", write_operand(expr, opt)),
                UnOp::IsNotNull => format!("{} IS NOT NULL", write_operand(expr, opt)),
            },
            Expr::Case {
                operand,
                branches,
                default,
            } => {
                let mut r = String::from("CASE");
                if let Some(operand) = operand {
                    r += " ";
                    r += &operand.write(opt);
                }
                for (when, then) in branches {
                    r += &format!(" WHEN {} THEN {}", when.write(opt), then.write(opt));
                }
                if let Some(default) = default {
                    r += " ELSE ";
                    r += &default.write(opt);
                }
                r += " END";
                r
            }
            Expr::List(items) => format!("[{}]", comma_separated(items, opt)),
            Expr::Map(entries) => write_map(entries, opt),
            Expr::MapProjection { subject } => format!("{}{{.*}}", write_ident(subject)),
            Expr::Star => "*".to_string(),
        }
    }
}

impl Expr {
    fn is_logical(&self) -> bool {
        matches!(self, Expr::Binary { op, .. } if op.is_logical())
    }

    /// Comparisons and string predicates, which are written without
    /// parentheses of their own.
    fn is_predicate(&self) -> bool {
        match self {
            Expr::Binary { op, .. } => !op.is_logical() && !op.is_arithmetic(),
            Expr::Unary { op, .. } => *op != UnOp::Not,
            _ => false,
        }
    }
}

fn write_operand(expr: &Expr, opt: &WriteOpt) -> String {
    if expr.is_predicate() {
        expr.write_between("(", ")", opt)
    } else {
        expr.write(opt)
    }
}

/// `(a AND b) AND c` is written as `(a AND b AND c)`.
fn flatten_logical(expr: &Expr, op: BinOp) -> Vec<&Expr> {
    match expr {
        Expr::Binary {
            left,
            op: inner,
            right,
        } if *inner == op => {
            let mut operands = flatten_logical(left, op);
            operands.extend(flatten_logical(right, op));
            operands
        }
        _ => vec![expr],
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    fn node(var: &str, label: &str) -> NodePattern {
        NodePattern::new(var, label)
    }

    fn prop(var: &str, name: &str) -> Expr {
        Expr::var(var).property(name)
    }

    fn number(n: &str) -> Expr {
        Expr::Literal(Literal::Number(n.to_string()))
    }

    #[test]
    fn test_match_return() {
        let statement = Statement {
            clauses: vec![
                Clause::Match {
                    patterns: vec![Pattern::from(node("o", "Order")).then(
                        RelPattern::new(
                            Some("purchased".to_string()),
                            "PURCHASED",
                            Direction::RightToLeft,
                        ),
                        node("c", "Customer"),
                    )],
                    predicate: Some(Expr::binary(
                        prop("o", "OrderDate").property("year"),
                        BinOp::Eq,
                        number("1996"),
                    )),
                },
                Clause::Return(Return {
                    items: vec![ReturnItem::new(Expr::Star)],
                    limit: Some(number("5")),
                    ..Default::default()
                }),
            ],
        };

        assert_snapshot!(render(&statement, &WriteOpt::default()), @"MATCH (o:Order)<-[purchased:PURCHASED]-(c:Customer) WHERE o.OrderDate.year = 1996 RETURN * LIMIT 5");

        let opt = WriteOpt {
            pretty: true,
            escape_names: true,
            ..Default::default()
        };
        assert_snapshot!(render(&statement, &opt), @r"
        MATCH (o:`Order`)<-[purchased:`PURCHASED`]-(c:`Customer`)
        WHERE o.OrderDate.year = 1996
        RETURN *
        LIMIT 5
        ");
    }

    #[test]
    fn test_logical_chains() {
        let a = Expr::binary(prop("n", "a"), BinOp::Eq, number("1"));
        let b = Expr::binary(prop("n", "b"), BinOp::Gt, number("2"));
        let c = Expr::unary(UnOp::IsNull, prop("n", "c"));

        let expr = a.clone().and(b.clone()).and(c.clone());
        assert_snapshot!(expr.write(&WriteOpt::default()), @"(n.a = 1 AND n.b > 2 AND n.c IS NULL)");

        let expr = a.clone().or(b.clone().and(c)).not();
        assert_snapshot!(expr.write(&WriteOpt::default()), @"NOT (n.a = 1 OR (n.b > 2 AND n.c IS NULL))");

        assert_snapshot!(a.not().write(&WriteOpt::default()), @"NOT (n.a = 1)");
    }

    #[test]
    fn test_arithmetic_is_parenthesized() {
        let concat = Expr::binary(
            Expr::binary(Expr::string("a"), BinOp::Add, Expr::string("b")),
            BinOp::Add,
            Expr::string("c"),
        );
        assert_snapshot!(concat.write(&WriteOpt::default()), @"(('a' + 'b') + 'c')");

        let log = Expr::binary(
            Expr::call("log", vec![prop("n", "x")]),
            BinOp::Div,
            Expr::call("log", vec![number("2")]),
        );
        let cmp = Expr::binary(log, BinOp::Lt, number("3"));
        assert_snapshot!(cmp.write(&WriteOpt::default()), @"(log(n.x) / log(2)) < 3");
    }

    #[test]
    fn test_names_and_literals() {
        let opt = WriteOpt::default();
        assert_snapshot!(ReturnItem::aliased(Expr::var("movie").element_id(), "v$id").write(&opt), @"elementId(movie) AS `v$id`");
        assert_snapshot!(Expr::string("it's").write(&opt), @r"'it\'s'");
        assert_snapshot!(Expr::Parameter("1".to_string()).write(&opt), @"$1");
        assert_snapshot!(Expr::Parameter("name".to_string()).write(&opt), @"$name");
        assert_snapshot!(Expr::MapProjection { subject: "m".to_string() }.write(&opt), @"m{.*}");
        assert_snapshot!(
            Expr::var("properties").index(Expr::string("lhs")).index(Expr::string("a")).write(&opt),
            @"properties['lhs']['a']"
        );
        assert_snapshot!(
            Expr::Case {
                operand: None,
                branches: vec![(Expr::binary(prop("n", "a"), BinOp::Eq, prop("n", "b")), Expr::null())],
                default: Some(Box::new(prop("n", "a"))),
            }
            .write(&opt),
            @"CASE WHEN n.a = n.b THEN NULL ELSE n.a END"
        );
    }

    #[test]
    fn test_name_case() {
        let opt = WriteOpt {
            name_case: NameCase::Upper,
            ..Default::default()
        };
        let node = node("n", "Movie").with_properties(vec![("title".to_string(), Expr::string("a"))]);
        assert_snapshot!(node.write(&opt), @"(n:Movie {TITLE: 'a'})");
        assert_snapshot!(prop("n", "title").write(&opt), @"n.TITLE");
    }

    #[test]
    fn test_unwind() {
        let statement = Statement {
            clauses: vec![Clause::Unwind {
                list: Expr::List(vec![Expr::Map(vec![("title".to_string(), Expr::string("a"))])]),
                alias: "properties".to_string(),
                body: vec![
                    Clause::Create {
                        patterns: vec![Pattern::from(node("movie", "Movie"))],
                    },
                    Clause::Set {
                        items: vec![SetItem::new(Expr::var("movie"), Expr::var("properties"))],
                    },
                ],
            }],
        };
        assert_snapshot!(render(&statement, &WriteOpt::default()), @"UNWIND [{title: 'a'}] AS properties CREATE (movie:Movie) SET movie = properties");
    }

    #[test]
    fn test_anonymous_relationship() {
        let pattern = Pattern::from(NodePattern::named("_lhs")).then(
            RelPattern::new(None, "ACTED_IN", Direction::LeftToRight)
                .with_properties(vec![("role".to_string(), Expr::string("Neo"))]),
            NodePattern::named("_rhs"),
        );
        assert_snapshot!(pattern.write(&WriteOpt::default()), @"(_lhs)-[:ACTED_IN {role: 'Neo'}]->(_rhs)");
    }
}
