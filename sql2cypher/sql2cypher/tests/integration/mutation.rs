use insta::assert_snapshot;
use sql2cypher::Options;

use super::{movies_metadata, translate_default, translate_err};

#[test]
fn test_insert() {
    assert_snapshot!(
        translate_default("INSERT INTO Movie(title, released) VALUES('Matrix', 1999)"),
        @"CREATE (movie:Movie {title: 'Matrix', released: 1999})"
    );

    assert_snapshot!(
        translate_default("INSERT INTO Movie(title, released) VALUES('Matrix', 1999), ('Speed', ?)"),
        @"UNWIND [{title: 'Matrix', released: 1999}, {title: 'Speed', released: $1}] AS properties CREATE (movie:Movie) SET movie = properties"
    );
}

#[test]
fn test_insert_returning() {
    assert_snapshot!(
        translate_default("INSERT INTO Movie(title) VALUES('Matrix') RETURNING title, v$id"),
        @"CREATE (movie:Movie {title: 'Matrix'}) RETURN movie.title AS title, elementId(movie) AS `v$id`"
    );

    assert_snapshot!(
        translate_default("INSERT INTO Movie(title) VALUES('Matrix'), ('Speed') RETURNING title"),
        @"UNWIND [{title: 'Matrix'}, {title: 'Speed'}] AS properties CREATE (movie:Movie) SET movie = properties RETURN movie.title AS title"
    );
}

#[test]
fn test_insert_without_column_list() {
    let cypher = sql2cypher::translate_with_metadata(
        "INSERT INTO Movie VALUES('Matrix', 1999)",
        &Options::default(),
        &movies_metadata(),
    )
    .unwrap();
    assert_snapshot!(cypher, @"CREATE (movie:Movie {title: 'Matrix', released: 1999})");

    assert_snapshot!(translate_err("INSERT INTO Movie VALUES('Matrix', 1999)", &Options::default()), @r"
    [E0002] Error: Unsupported SQL expression: INSERT without a column list
    ↳ Hint: name the columns to insert, as in `INSERT INTO t (a, b) VALUES ...`
    ");
}

#[test]
fn test_upsert() {
    assert_snapshot!(
        translate_default("INSERT INTO Movie(title) VALUES(?) ON CONFLICT(title) DO NOTHING"),
        @"MERGE (movie:Movie {title: $1})"
    );

    assert_snapshot!(
        translate_default("INSERT INTO Movie(title) VALUES('Matrix') ON DUPLICATE KEY IGNORE"),
        @"MERGE (movie:Movie {title: 'Matrix'})"
    );

    assert_snapshot!(
        translate_default("INSERT INTO Movie(title, released) VALUES('Matrix', 1999) ON CONFLICT(title) DO UPDATE SET released = EXCLUDED.released"),
        @"MERGE (movie:Movie {title: 'Matrix'}) ON CREATE SET movie.released = 1999 ON MATCH SET movie.released = 1999"
    );

    assert_snapshot!(
        translate_default("INSERT INTO Movie(title, released) VALUES('Matrix', 1999) ON DUPLICATE KEY UPDATE released = VALUES(released)"),
        @"MERGE (movie:Movie {title: 'Matrix', released: 1999}) ON MATCH SET movie.released = 1999"
    );
}

#[test]
fn test_upsert_multiple_rows() {
    assert_snapshot!(
        translate_default("INSERT INTO Movie(title, released) VALUES('Matrix', 1999), ('Speed', 1994) ON CONFLICT(title) DO UPDATE SET released = EXCLUDED.released"),
        @"UNWIND [{title: 'Matrix', released: 1999}, {title: 'Speed', released: 1994}] AS properties MERGE (movie:Movie {title: properties['title']}) ON CREATE SET movie.released = properties['released'] ON MATCH SET movie.released = properties['released']"
    );

    assert_snapshot!(
        translate_err("INSERT INTO Movie(title) VALUES('Matrix'), ('Speed') ON DUPLICATE KEY IGNORE", &Options::default()),
        @"[E0002] Error: `ON DUPLICATE` and `ON CONFLICT` clauses are not supported when inserting multiple rows without using a property to merge on"
    );
}

#[test]
fn test_update() {
    assert_snapshot!(
        translate_default("UPDATE Movie SET title = 'The Matrix' WHERE id = 1"),
        @"MATCH (movie:Movie) WHERE movie.id = 1 SET movie.title = 'The Matrix'"
    );

    assert_snapshot!(
        translate_default("UPDATE Movie m SET m.title = ?, m.released = ? WHERE m.id = ?"),
        @"MATCH (m:Movie) WHERE m.id = $3 SET m.title = $1, m.released = $2"
    );
}

#[test]
fn test_delete() {
    assert_snapshot!(
        translate_default("DELETE FROM Person p WHERE p.id = 1"),
        @"MATCH (p:Person) WHERE p.id = 1 DELETE p"
    );

    assert_snapshot!(translate_default("DELETE FROM Person"), @"MATCH (person:Person) DELETE person");
}

#[test]
fn test_truncate() {
    assert_snapshot!(translate_default("TRUNCATE TABLE Person"), @"MATCH (person:Person) DETACH DELETE person");

    assert_snapshot!(
        translate_default("TRUNCATE TABLE Person, Movie"),
        @"MATCH (person:Person) DETACH DELETE person WITH count(*) AS _ MATCH (movie:Movie) DETACH DELETE movie"
    );
}
