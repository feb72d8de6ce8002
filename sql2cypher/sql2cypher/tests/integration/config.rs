use insta::{assert_debug_snapshot, assert_snapshot};
use sql2cypher::{json, NameCase, Options, Translator};

use super::{translate, translate_default};

fn from_properties(properties: &[(&str, &str)]) -> Options {
    Options::from_properties(properties.iter().copied()).unwrap()
}

#[test]
fn test_pretty_and_escaped() {
    let options = from_properties(&[("s2c.prettyPrint", "true"), ("s2c.alwaysEscapeNames", "true")]);
    assert_snapshot!(translate("SELECT title FROM Movie WHERE released > 2000", &options), @r"
    MATCH (movie:`Movie`)
    WHERE movie.released > 2000
    RETURN movie.title AS title
    ");
}

#[test]
fn test_name_case() {
    let options = Options::default().with_render_name_case(NameCase::Upper);
    assert_snapshot!(translate("SELECT title FROM Movie", &options), @"MATCH (movie:Movie) RETURN movie.TITLE AS title");

    let options = from_properties(&[
        ("s2c.parseNameCase", "LOWER_IF_UNQUOTED"),
        ("s2c.tableToLabelMappings", "movie:Movie"),
    ]);
    assert_snapshot!(translate("SELECT Title FROM MOVIE", &options), @"MATCH (movie:Movie) RETURN movie.title AS title");
}

#[test]
fn test_relationship_pattern() {
    let options = from_properties(&[(
        "s2c.relationshipPattern",
        "^(?<start>[A-Za-z]+)__(?<reltype>[A-Z_]+)__(?<end>[A-Za-z]+)$",
    )]);
    assert_snapshot!(
        translate("SELECT * FROM Person__ACTED_IN__Movie", &options),
        @"MATCH (_lhs:Person)-[person__acted_in__movie:ACTED_IN]->(_rhs:Movie) RETURN *"
    );

    let options = from_properties(&[("s2c.relationshipPattern", "")]);
    assert_snapshot!(
        translate("SELECT * FROM Person_ACTED_IN_Movie", &options),
        @"MATCH (person_acted_in_movie:Person_ACTED_IN_Movie) RETURN *"
    );
}

#[test]
fn test_join_column_mappings() {
    let options = from_properties(&[
        ("s2c.tableToLabelMappings", "people:Person;movies:Movie"),
        ("s2c.joinColumnsToTypeMappings", "people.movie_id:ACTED_IN"),
    ]);
    assert_snapshot!(
        translate("SELECT p.name, m.title FROM people p JOIN movies m ON m.id = p.movie_id", &options),
        @"MATCH (p:Person)-[acted_in:ACTED_IN]->(m:Movie) RETURN p.name, m.title"
    );
}

#[test]
fn test_translator() {
    let translator = Translator::new(from_properties(&[("s2c.precedence", "10")])).unwrap();
    assert_eq!(translator.order(), 10);
    assert!(translator.cache().is_none());

    let translator = Translator::new(Options::default()).unwrap();
    assert_eq!(translator.order(), i32::MAX);
}

#[test]
fn test_stages() {
    let options = Options::default();
    let sql = "SELECT m.title FROM Movie m WHERE m.released = 1999";

    let ast = sql2cypher::sql_to_ast(sql, &options).unwrap();
    assert_debug_snapshot!(ast.as_select().unwrap().from, @r#"
    [
        Table(
            TableRef {
                name: "Movie",
                schema: None,
                alias: Some(
                    "m",
                ),
                annotation: None,
            },
        ),
    ]
    "#);

    let ir = sql2cypher::ast_to_ir(&ast, &options, None).unwrap();
    let ir = json::to_cypher(&json::from_cypher(&ir).unwrap()).unwrap();
    assert_eq!(
        sql2cypher::ir_to_cypher(&ir, &options),
        translate_default(sql)
    );

    let err = json::to_cypher("{\"clauses\": 1}").unwrap_err();
    assert!(err.to_string().starts_with("Error: invalid type"), "{err}");
}
