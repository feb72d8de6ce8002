use sql2cypher::{Options, StaticMetadata};

mod cache;
mod config;
mod mutation;
mod relationships;
mod select;

fn translate(sql: &str, options: &Options) -> String {
    sql2cypher::translate(sql, options).unwrap_or_else(|e| panic!("{e}\nwhile translating `{sql}`"))
}

fn translate_default(sql: &str) -> String {
    translate(sql, &Options::default())
}

fn translate_err(sql: &str, options: &Options) -> String {
    match sql2cypher::translate(sql, options) {
        Ok(cypher) => panic!("`{sql}` translated to `{cypher}`, expected an error"),
        Err(e) => e.to_string(),
    }
}

/// The tables of the Northwind sample database, as they map to its graph.
fn northwind() -> Options {
    Options::default()
        .with_table_mapping("Customers", "Customer")
        .with_table_mapping("Orders", "Order")
        .with_join_column_mapping("Orders.CustomerID", "PURCHASED")
}

fn movies_metadata() -> StaticMetadata {
    StaticMetadata::new()
        .with_columns("Person", ["name", "born"])
        .with_columns("Movie", ["title", "released"])
        .with_columns("Person_ACTED_IN_Movie", ["role"])
}
