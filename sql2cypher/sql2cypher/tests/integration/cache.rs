use similar_asserts::assert_eq;
use sql2cypher::{Options, Translator};

use super::movies_metadata;

fn cached_translator() -> Translator {
    Translator::new(Options::from_properties([("cacheSQLTranslations", "true")]).unwrap()).unwrap()
}

#[test]
fn test_translations_are_cached() {
    let mut translator = cached_translator();
    assert_eq!(translator.cache().map(|c| c.capacity()), Some(64));

    let first = translator.translate("SELECT title FROM Movie").unwrap();
    let second = translator.translate("SELECT title FROM Movie").unwrap();
    assert_eq!(first, second);
    assert_eq!(translator.cache().map(|c| c.len()), Some(1));

    translator.translate("SELECT name FROM Person").unwrap();
    assert_eq!(translator.cache().map(|c| c.len()), Some(2));

    translator.flush_cache();
    assert_eq!(translator.cache().map(|c| c.is_empty()), Some(true));
}

#[test]
fn test_failures_and_metadata_are_not_cached() {
    let mut translator = cached_translator();

    assert!(translator.translate("SELECT * FROM").is_err());
    translator
        .translate_with_metadata("SELECT * FROM Movie", &movies_metadata())
        .unwrap();
    assert_eq!(translator.cache().map(|c| c.len()), Some(0));
}

#[test]
fn test_cache_size() {
    let options = Options::from_properties([("s2c.enableCache", "true"), ("s2c.cacheSize", "1")]).unwrap();
    let mut translator = Translator::new(options).unwrap();

    translator.translate("SELECT title FROM Movie").unwrap();
    translator.translate("SELECT name FROM Person").unwrap();
    let cache = translator.cache().unwrap();
    assert_eq!(cache.len(), 1);
    assert!(cache.contains("SELECT name FROM Person", translator.options()));
    assert!(!cache.contains("SELECT title FROM Movie", translator.options()));

    let options = Options::default().with_cache(true).with_cache_size(0);
    let err = Translator::new(options).unwrap_err();
    assert_eq!(
        err.to_string(),
        "[E0004] Error: invalid configuration: the cache size must be greater than 0"
    );
}
