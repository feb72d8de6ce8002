use insta::assert_snapshot;
use sql2cypher::{Options, RelationshipTable, StaticMetadata};

use super::{movies_metadata, translate_default, translate_err};

fn with_metadata(sql: &str, options: &Options, metadata: &StaticMetadata) -> String {
    sql2cypher::translate_with_metadata(sql, options, metadata).unwrap()
}

#[test]
fn test_select_relationship_table() {
    assert_snapshot!(
        translate_default("SELECT * FROM Person_ACTED_IN_Movie"),
        @"MATCH (_lhs:Person)-[person_acted_in_movie:ACTED_IN]->(_rhs:Movie) RETURN *"
    );

    assert_snapshot!(
        translate_default("SELECT * FROM acted /* start=Person, type=ACTED_IN, end=Movie */"),
        @"MATCH (_lhs:Person)-[acted:ACTED_IN]->(_rhs:Movie) RETURN *"
    );

    assert_snapshot!(
        with_metadata(
            "SELECT name, role, title FROM Person_ACTED_IN_Movie",
            &Options::default(),
            &movies_metadata()
        ),
        @"MATCH (_lhs:Person)-[person_acted_in_movie:ACTED_IN]->(_rhs:Movie) RETURN _lhs.name AS name, person_acted_in_movie.role AS role, _rhs.title AS title"
    );
}

#[test]
fn test_relationship_from_metadata() {
    let metadata = movies_metadata().with_relationship_table(
        "actors",
        RelationshipTable::new("Person", "ACTED_IN", "Movie"),
    );
    assert_snapshot!(
        with_metadata("SELECT a.role FROM actors a WHERE a.name = 'Keanu'", &Options::default(), &metadata),
        @"MATCH (_lhs:Person)-[a:ACTED_IN]->(_rhs:Movie) WHERE _lhs.name = 'Keanu' RETURN a.role"
    );
}

#[test]
fn test_star_expansion() {
    assert_snapshot!(
        with_metadata("SELECT * FROM Person_ACTED_IN_Movie", &Options::default(), &movies_metadata()),
        @"MATCH (_lhs:Person)-[person_acted_in_movie:ACTED_IN]->(_rhs:Movie) RETURN elementId(_lhs) AS `v$person_id`, elementId(person_acted_in_movie) AS `v$id`, person_acted_in_movie.role AS role, elementId(_rhs) AS `v$movie_id`"
    );

    let metadata = StaticMetadata::new()
        .with_columns("Movie", ["title"])
        .with_columns("Has", ["foobar"])
        .with_columns("Genre", ["name"]);
    let options = Options::default().with_table_mapping("Has", "HAS");
    assert_snapshot!(
        with_metadata("SELECT * FROM Movie NATURAL JOIN Has NATURAL JOIN Genre", &options, &metadata),
        @"MATCH (movie:Movie)-[has:HAS]->(genre:Genre) RETURN elementId(movie) AS `v$id`, movie.title AS title, elementId(movie) AS `v$movie_id`, elementId(has) AS `v$id1`, has.foobar AS foobar, elementId(genre) AS `v$genre_id`, elementId(genre) AS `v$id2`, genre.name AS name"
    );
}

#[test]
fn test_element_ids() {
    assert_snapshot!(
        translate_default(r#"SELECT title FROM Movie WHERE "v$id" = ?"#),
        @"MATCH (movie:Movie) WHERE elementId(movie) = $1 RETURN movie.title AS title"
    );
}

#[test]
fn test_insert_relationship() {
    assert_snapshot!(
        translate_default("INSERT INTO Person_ACTED_IN_Movie(Person.name, role, Movie.title) VALUES('Keanu', 'Neo', 'Matrix')"),
        @"MERGE (_lhs:Person {name: 'Keanu'}) MERGE (_rhs:Movie {title: 'Matrix'}) CREATE (_lhs)-[:ACTED_IN {role: 'Neo'}]->(_rhs)"
    );

    // unqualified columns are attributed through metadata
    assert_snapshot!(
        with_metadata(
            "INSERT INTO Person_ACTED_IN_Movie(name, role, title) VALUES('Keanu', 'Neo', 'Matrix')",
            &Options::default(),
            &movies_metadata()
        ),
        @"MERGE (_lhs:Person {name: 'Keanu'}) MERGE (_rhs:Movie {title: 'Matrix'}) CREATE (_lhs)-[:ACTED_IN {role: 'Neo'}]->(_rhs)"
    );

    assert_snapshot!(
        translate_default("INSERT INTO Person_ACTED_IN_Movie(role) VALUES('Neo')"),
        @"CREATE (_lhs:Person) CREATE (_rhs:Movie) CREATE (_lhs)-[:ACTED_IN {role: 'Neo'}]->(_rhs)"
    );
}

#[test]
fn test_insert_relationships() {
    assert_snapshot!(
        translate_default("INSERT INTO Person_ACTED_IN_Movie(Person.name, Person.born, role, Movie.title) VALUES('Keanu', NULL, 'Neo', 'Matrix'), ('Carrie', NULL, 'Trinity', 'Matrix')"),
        @"UNWIND [{lhs: {name: 'Keanu'}, rel: {role: 'Neo'}, rhs: {title: 'Matrix'}}, {lhs: {name: 'Carrie'}, rel: {role: 'Trinity'}, rhs: {title: 'Matrix'}}] AS properties MERGE (_lhs:Person {name: properties['lhs']['name']}) MERGE (_rhs:Movie {title: properties['rhs']['title']}) CREATE (_lhs)-[person_acted_in_movie:ACTED_IN]->(_rhs) SET person_acted_in_movie = properties['rel']"
    );

    assert_snapshot!(
        translate_default("INSERT INTO Person_ACTED_IN_Movie(role) VALUES('Neo'), ('Trinity')"),
        @"UNWIND [{lhs: {}, rel: {role: 'Neo'}, rhs: {}}, {lhs: {}, rel: {role: 'Trinity'}, rhs: {}}] AS properties CREATE (_lhs:Person)-[person_acted_in_movie:ACTED_IN]->(_rhs:Movie) SET _lhs = properties['lhs'] SET person_acted_in_movie = properties['rel'] SET _rhs = properties['rhs']"
    );
}

#[test]
fn test_insert_relationship_errors() {
    let options = Options::default();

    assert_snapshot!(
        translate_err("INSERT INTO Person_ACTED_IN_Movie(Person.name, Person.born, Movie.title) VALUES('Keanu', 1964, 'Matrix'), ('Carrie', NULL, 'Matrix')", &options),
        @"[E0002] Error: Unsupported SQL expression: NULL in only some rows of the column `Person.born`, which is merged on"
    );

    assert_snapshot!(
        translate_err("INSERT INTO Person_ACTED_IN_Movie(Person.name, Movie.title) VALUES('Keanu', 'Matrix') ON DUPLICATE KEY IGNORE", &options),
        @"[E0002] Error: `ON DUPLICATE` and `ON CONFLICT` clauses are not supported for inserting relationships"
    );

    assert_snapshot!(
        translate_err("INSERT INTO Person_ACTED_IN_Movie (name, role, title) VALUES ('a', 'r', 't'), ('b', 's', 'u') ON CONFLICT DO NOTHING", &options),
        @"[E0002] Error: `ON DUPLICATE` and `ON CONFLICT` clauses are not supported for inserting relationships"
    );

    assert_snapshot!(
        translate_err("INSERT INTO Person_ACTED_IN_Movie (name, role, title) VALUES ('a', 'r', 't'), ('b', 's', 'u') ON DUPLICATE KEY UPDATE role = VALUES(role)", &options),
        @"[E0002] Error: `ON DUPLICATE` and `ON CONFLICT` clauses are not supported for inserting relationships"
    );
}

#[test]
fn test_update_relationship() {
    assert_snapshot!(
        translate_default("UPDATE Person_ACTED_IN_Movie SET role = 'Trinity' WHERE Person.name = 'Carrie' AND Movie.title = 'Matrix'"),
        @"MATCH (_lhs:Person)-[person_acted_in_movie:ACTED_IN]->(_rhs:Movie) WHERE (_lhs.name = 'Carrie' AND _rhs.title = 'Matrix') SET person_acted_in_movie.role = 'Trinity'"
    );
}

#[test]
fn test_column_ownership() {
    let metadata = StaticMetadata::new()
        .with_columns("Person", ["a"])
        .with_columns("Person_ACTED_IN_Movie", ["b", "d"])
        .with_columns("Movie", ["c"]);
    assert_snapshot!(
        with_metadata(
            "UPDATE Person_ACTED_IN_Movie SET a = 'x', b = 'y' WHERE c = 'z' AND \"v$person_id\" = ?",
            &Options::default(),
            &metadata
        ),
        @"MATCH (_lhs:Person)-[person_acted_in_movie:ACTED_IN]->(_rhs:Movie) WHERE (_rhs.c = 'z' AND elementId(_lhs) = $1) SET _lhs.a = 'x', person_acted_in_movie.b = 'y'"
    );
}

#[test]
fn test_delete_relationship() {
    assert_snapshot!(
        translate_default("DELETE FROM Person_ACTED_IN_Movie WHERE Person.name = 'Keanu'"),
        @"MATCH (_lhs:Person)-[person_acted_in_movie:ACTED_IN]->(_rhs:Movie) WHERE _lhs.name = 'Keanu' DELETE person_acted_in_movie"
    );

    assert_snapshot!(
        translate_default("TRUNCATE TABLE Person_ACTED_IN_Movie"),
        @"MATCH (_lhs:Person)-[person_acted_in_movie:ACTED_IN]->(_rhs:Movie) DELETE person_acted_in_movie"
    );
}
