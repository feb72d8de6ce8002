use insta::assert_snapshot;
use rstest::rstest;
use sql2cypher::{Dialect, Options};

use super::{northwind, translate, translate_default, translate_err};

#[test]
fn test_simple_select() {
    assert_snapshot!(translate_default("SELECT t.a, t.b FROM My_Table AS t WHERE t.a = 1"), @"MATCH (t:My_Table) WHERE t.a = 1 RETURN t.a, t.b");

    assert_snapshot!(translate_default("SELECT name FROM Person"), @"MATCH (person:Person) RETURN person.name AS name");

    assert_snapshot!(translate_default("SELECT DISTINCT m.title AS t FROM Movie m"), @"MATCH (m:Movie) RETURN DISTINCT m.title AS t");
}

#[test]
fn test_pretty() {
    let options = Options::default().with_pretty(true);
    assert_snapshot!(translate("SELECT t.a, t.b FROM My_Table AS t WHERE t.a = 1 ORDER BY t.b LIMIT 3", &options), @r"
    MATCH (t:My_Table)
    WHERE t.a = 1
    RETURN t.a, t.b
    ORDER BY t.b
    LIMIT 3
    ");
}

#[test]
fn test_order_skip_limit() {
    assert_snapshot!(translate_default("SELECT m.title FROM Movie m ORDER BY m.released DESC, m.title ASC LIMIT 10 OFFSET 5"), @"MATCH (m:Movie) RETURN m.title ORDER BY m.released DESC, m.title ASC SKIP 5 LIMIT 10");
}

#[test]
fn test_top() {
    let options = northwind().with_dialect(Dialect::MsSql);
    assert_snapshot!(translate("SELECT TOP 25 c FROM Customers c", &options), @"MATCH (c:Customer) RETURN c LIMIT 25");
}

#[test]
fn test_join_on_mapped_column() {
    assert_snapshot!(
        translate(
            "SELECT c.CompanyName, o.OrderDate FROM Orders o JOIN Customers c ON o.CustomerID = c.CustomerID",
            &northwind()
        ),
        @"MATCH (o:Order)<-[purchased:PURCHASED]-(c:Customer) RETURN c.CompanyName, o.OrderDate"
    );
}

#[test]
fn test_join_through_table() {
    assert_snapshot!(
        translate_default("SELECT p, r, m FROM Person p JOIN ACTED_IN r ON (p.id = r.person_id) JOIN Movie m ON (m.id = r.movie_id)"),
        @"MATCH (p:Person)-[r:ACTED_IN]->(m:Movie) RETURN p, r, m"
    );
}

#[test]
fn test_join_using() {
    assert_snapshot!(
        translate_default("SELECT p.name, m.title FROM Person p JOIN Movie m USING (ACTED_IN)"),
        @"MATCH (p:Person)-[acted_in:ACTED_IN]->(m:Movie) RETURN p.name, m.title"
    );

    assert_snapshot!(
        translate_default("SELECT p, m FROM Person p JOIN Movie m USING (ACTED_IN)"),
        @"MATCH (p:Person)-[acted_in:ACTED_IN]->(m:Movie) RETURN p, m"
    );
}

#[test]
fn test_predicates() {
    assert_snapshot!(
        translate_default("SELECT count(*) FROM Movie m WHERE m.title LIKE '%Matrix%'"),
        @"MATCH (m:Movie) WHERE m.title CONTAINS 'Matrix' RETURN count(*)"
    );

    assert_snapshot!(
        translate_default("SELECT m.title FROM Movie m WHERE m.title ILIKE 'the_%' AND m.released BETWEEN 1990 AND 2000"),
        @"MATCH (m:Movie) WHERE (m.title =~ '(?i)the..*' AND 1990 <= m.released AND m.released <= 2000) RETURN m.title"
    );

    assert_snapshot!(
        translate_default("SELECT m.title FROM Movie m WHERE m.released IN (1999, 2003) OR m.tagline IS NULL"),
        @"MATCH (m:Movie) WHERE (m.released IN [1999, 2003] OR m.tagline IS NULL) RETURN m.title"
    );

    assert_snapshot!(
        translate_default("SELECT m.title FROM Movie m WHERE NOT (m.released > 2000 OR m.title <> 'Speed')"),
        @"MATCH (m:Movie) WHERE NOT (m.released > 2000 OR m.title <> 'Speed') RETURN m.title"
    );
}

#[test]
fn test_row_value_comparison() {
    assert_snapshot!(
        translate_default("SELECT m.title FROM Movie m WHERE (m.released, m.title) < (2000, 'M')"),
        @"MATCH (m:Movie) WHERE (m.released < 2000 OR (m.released = 2000 AND m.title < 'M')) RETURN m.title"
    );
}

#[test]
fn test_parameters() {
    assert_snapshot!(
        translate_default("SELECT m.title FROM Movie m WHERE m.released > ? AND m.title = :title AND m.id = ?"),
        @"MATCH (m:Movie) WHERE (m.released > $1 AND m.title = $title AND m.id = $2) RETURN m.title"
    );

    let options = Options::default().with_named_param_prefix("$");
    assert_snapshot!(
        translate("SELECT m.title FROM Movie m WHERE m.title = $title", &options),
        @"MATCH (m:Movie) WHERE m.title = $title RETURN m.title"
    );
}

#[test]
fn test_functions() {
    assert_snapshot!(
        translate_default("SELECT upper(name), coalesce(a, b), power(x, 2), concat(a, '-', b) FROM Movie"),
        @"MATCH (movie:Movie) RETURN toUpper(movie.name), coalesce(movie.a, movie.b), (movie.x ^ 2), (movie.a + ('-' + movie.b))"
    );

    assert_snapshot!(
        translate_default("SELECT count(DISTINCT m.title), avg(m.released) FROM Movie m"),
        @"MATCH (m:Movie) RETURN count(DISTINCT m.title), avg(m.released)"
    );

    assert_snapshot!(
        translate_default("SELECT EXTRACT(YEAR FROM o.OrderDate), CAST(o.Freight AS VARCHAR) FROM Orders o"),
        @"MATCH (o:Orders) RETURN o.OrderDate.year, toString(o.Freight)"
    );
}

#[rstest]
#[case("LOG(m.x)", "log(m.x)")]
#[case("LN(m.x)", "log(m.x)")]
#[case("LOG10(m.x)", "log10(m.x)")]
#[case("LOG(2, m.x)", "(log(m.x) / log(2))")]
#[case("SQRT(m.x)", "sqrt(m.x)")]
fn test_logarithms(#[case] function: &str, #[case] expected: &str) {
    assert_eq!(
        translate_default(&format!("SELECT {function} FROM Movie m")),
        format!("MATCH (m:Movie) RETURN {expected}")
    );
}

#[test]
fn test_case() {
    assert_snapshot!(
        translate_default("SELECT CASE WHEN m.released < 2000 THEN 'old' ELSE 'new' END AS age FROM Movie m"),
        @"MATCH (m:Movie) RETURN CASE WHEN m.released < 2000 THEN 'old' ELSE 'new' END AS age"
    );
}

#[test]
fn test_derived_table() {
    assert_snapshot!(
        translate_default("SELECT * FROM (SELECT * FROM Movie) AS m WHERE title = 'The Matrix'"),
        @"MATCH (movie:Movie) RETURN * LIMIT 1"
    );
}

#[test]
fn test_without_from() {
    assert_snapshot!(translate_default("SELECT 1"), @"RETURN 1");
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("/* nothing to see */")]
#[case("// just a comment")]
fn test_empty_input(#[case] sql: &str) {
    assert_eq!(translate_default(sql), "FINISH");
}

#[test]
fn test_errors() {
    let options = Options::default();

    assert_snapshot!(translate_err("SELECT -m.released FROM Movie m", &options), @"[E0002] Error: Unsupported SQL expression: NEG");

    assert_snapshot!(
        translate_err("SELECT p.name FROM Person p JOIN Movie m USING (movie_id) WHERE title = 'x'", &options),
        @r"
    [E0003] Error: Column `title` could not be resolved against the tables `p`, `m`
    ↳ Hint: qualify the column with the name or alias of its table
    "
    );

    assert_snapshot!(
        translate_err("SELECT EXTRACT(CENTURY FROM m.released) FROM Movie m", &options),
        @"[E0002] Error: Unsupported value for date/time extraction: CENTURY"
    );

    let err = sql2cypher::translate("SELECT * FROM", &options).unwrap_err();
    assert_eq!(err.code, Some("E0001"));
}
