use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Dialect, Error, NameCase, ParseOptions, Result};

const PROPERTY_PREFIX: &str = "s2c.";

/// Property keys that predate the `s2c.` namespace.
const PROPERTY_ALIASES: &[(&str, &str)] = &[("cacheSQLTranslations", "s2c.enableCache")];

const DEFAULT_RELATIONSHIP_PATTERN: &str =
    r"^(?<start>[A-Za-z][A-Za-z0-9]*)_(?<reltype>[A-Z][A-Z0-9_]*)_(?<end>[A-Za-z][A-Za-z0-9]*)$";

/// Translation options.
///
/// Two equal values always produce the same Cypher for the same SQL, which is
/// what allows them to be part of the translation cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Options {
    /// SQL dialect used for parsing.
    pub dialect: Dialect,

    /// Case applied to unquoted (or all) identifiers while parsing.
    pub parse_name_case: NameCase,

    /// Case applied to property names when rendering.
    pub render_name_case: NameCase,

    /// Emit one clause per line.
    ///
    /// Defaults to false.
    pub pretty: bool,

    /// Always escape labels and relationship types with backticks. Names
    /// that are not valid Cypher identifiers are escaped regardless.
    pub always_escape_names: bool,

    /// Prefix marking a named parameter, in addition to `:name`.
    pub named_param_prefix: Option<String>,

    /// Table name to node label. Keys are matched case-insensitively.
    pub table_to_label_mappings: BTreeMap<String, String>,

    /// `Table.column` used in a join to the relationship type it stands for.
    /// Keys are matched case-insensitively.
    pub join_columns_to_type_mappings: BTreeMap<String, String>,

    /// Decomposes a table name into `start`, `reltype` and `end`, turning the
    /// table into a relationship between two labels.
    pub relationship_pattern: Option<RelationshipPattern>,

    /// Opaque ordering hint for callers chaining several translators. Lower
    /// values go first.
    pub precedence: i32,

    /// Whether [crate::Translator] caches rendered statements.
    pub enable_cache: bool,

    /// Capacity of the translation cache.
    pub cache_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            parse_name_case: NameCase::default(),
            render_name_case: NameCase::default(),
            pretty: false,
            always_escape_names: false,
            named_param_prefix: None,
            table_to_label_mappings: BTreeMap::new(),
            join_columns_to_type_mappings: BTreeMap::new(),
            relationship_pattern: RelationshipPattern::new(DEFAULT_RELATIONSHIP_PATTERN).ok(),
            precedence: i32::MAX,
            enable_cache: false,
            cache_size: crate::cache::DEFAULT_CAPACITY,
        }
    }
}

impl Options {
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_parse_name_case(mut self, name_case: NameCase) -> Self {
        self.parse_name_case = name_case;
        self
    }

    pub fn with_render_name_case(mut self, name_case: NameCase) -> Self {
        self.render_name_case = name_case;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_always_escape_names(mut self, always_escape_names: bool) -> Self {
        self.always_escape_names = always_escape_names;
        self
    }

    pub fn with_named_param_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        let prefix = prefix.into();
        self.named_param_prefix = (!prefix.trim().is_empty()).then_some(prefix);
        self
    }

    pub fn with_table_mapping<T: Into<String>, L: Into<String>>(mut self, table: T, label: L) -> Self {
        self.table_to_label_mappings.insert(table.into(), label.into());
        self
    }

    pub fn with_table_to_label_mappings(mut self, mappings: BTreeMap<String, String>) -> Self {
        self.table_to_label_mappings = mappings;
        self
    }

    pub fn with_join_column_mapping<C: Into<String>, T: Into<String>>(
        mut self,
        column: C,
        rel_type: T,
    ) -> Self {
        (self.join_columns_to_type_mappings).insert(column.into(), rel_type.into());
        self
    }

    pub fn with_join_columns_to_type_mappings(mut self, mappings: BTreeMap<String, String>) -> Self {
        self.join_columns_to_type_mappings = mappings;
        self
    }

    pub fn with_relationship_pattern(mut self, pattern: Option<RelationshipPattern>) -> Self {
        self.relationship_pattern = pattern;
        self
    }

    pub fn with_precedence(mut self, precedence: i32) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn with_cache(mut self, enable_cache: bool) -> Self {
        self.enable_cache = enable_cache;
        self
    }

    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    /// The subset of options the SQL parser cares about.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            dialect: self.dialect,
            name_case: self.parse_name_case,
            named_param_prefix: self.named_param_prefix.clone(),
        }
    }

    /// Builds options from flat key-value properties, such as those of a
    /// driver configuration.
    ///
    /// Only keys starting with `s2c.` are considered; the rest of the key may
    /// be camelCase (`s2c.prettyPrint`) or kebab-case (`s2c.pretty-print`).
    /// Unknown `s2c.` keys are logged and ignored.
    pub fn from_properties<I, K, V>(properties: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Options::default();

        for (key, value) in properties {
            let key = key.as_ref();
            let key = PROPERTY_ALIASES
                .iter()
                .find(|(alias, _)| *alias == key)
                .map_or(key, |(_, target)| *target);
            let Some(name) = key.strip_prefix(PROPERTY_PREFIX) else {
                continue;
            };
            let value = value.as_ref();

            match camel_case(name).as_str() {
                "sqlDialect" => options.dialect = parse_enum(key, value)?,
                "parseNameCase" => options.parse_name_case = parse_enum(key, value)?,
                "renderNameCase" => options.render_name_case = parse_enum(key, value)?,
                "prettyPrint" => options.pretty = parse_bool(key, value)?,
                "alwaysEscapeNames" => options.always_escape_names = parse_bool(key, value)?,
                "parseNamedParamPrefix" => options = options.with_named_param_prefix(value),
                "tableToLabelMappings" => options.table_to_label_mappings = parse_map(key, value)?,
                "joinColumnsToTypeMappings" => {
                    options.join_columns_to_type_mappings = parse_map(key, value)?
                }
                "relationshipPattern" => {
                    options.relationship_pattern = match value.trim() {
                        "" => None,
                        pattern => Some(RelationshipPattern::new(pattern)?),
                    }
                }
                "precedence" => options.precedence = parse_number(key, value)?,
                "enableCache" => options.enable_cache = parse_bool(key, value)?,
                "cacheSize" => options.cache_size = parse_number(key, value)?,
                _ => log::warn!("unknown config option {key}"),
            }
        }

        Ok(options)
    }
}

fn camel_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        match c {
            '-' => upper_next = true,
            c if upper_next => {
                result.extend(c.to_uppercase());
                upper_next = false;
            }
            c => result.push(c),
        }
    }
    result
}

fn invalid(key: &str, value: &str, expected: &str) -> Error {
    Error::new_configuration(format!("`{value}` is not a valid value for `{key}`: {expected}"))
}

fn parse_enum<T: FromStr + strum::VariantNames>(key: &str, value: &str) -> Result<T> {
    T::from_str(value.trim())
        .map_err(|_| invalid(key, value, &format!("expected one of {}", T::VARIANTS.join(", "))))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim() {
        v if v.eq_ignore_ascii_case("true") => Ok(true),
        v if v.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(invalid(key, value, "expected `true` or `false`")),
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    (value.trim().parse()).map_err(|_| invalid(key, value, "expected an integer"))
}

/// Parses `k1:v1;k2:v2`.
fn parse_map(key: &str, value: &str) -> Result<BTreeMap<String, String>> {
    value
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((k, v)) if !k.trim().is_empty() && !v.trim().is_empty() => {
                Ok((k.trim().to_string(), v.trim().to_string()))
            }
            _ => Err(invalid(key, value, "expected `key:value` pairs separated by `;`")),
        })
        .collect()
}

/// A regex with the named groups `start`, `reltype` and `end`.
///
/// Compared, hashed and serialized by its source text.
#[derive(Debug, Clone)]
pub struct RelationshipPattern(Regex);

impl RelationshipPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            Error::new_configuration(format!("invalid relationship pattern `{pattern}`: {e}"))
        })?;

        let names: Vec<&str> = regex.capture_names().flatten().collect();
        for group in ["start", "reltype", "end"] {
            if !names.contains(&group) {
                return Err(Error::new_configuration(format!(
                    "relationship pattern `{pattern}` has no group named `{group}`"
                )));
            }
        }
        Ok(RelationshipPattern(regex))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Splits `table` into start label, relationship type and end label.
    pub fn decompose<'t>(&self, table: &'t str) -> Option<(&'t str, &'t str, &'t str)> {
        let captures = self.0.captures(table)?;
        Some((
            captures.name("start")?.as_str(),
            captures.name("reltype")?.as_str(),
            captures.name("end")?.as_str(),
        ))
    }
}

impl PartialEq for RelationshipPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for RelationshipPattern {}

impl Hash for RelationshipPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl Serialize for RelationshipPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RelationshipPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        RelationshipPattern::new(&pattern).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use insta::{assert_debug_snapshot, assert_snapshot};

    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert!(!options.pretty);
        assert!(!options.enable_cache);
        assert_eq!(options.precedence, i32::MAX);
        assert_eq!(options.cache_size, 64);
        assert_eq!(options, Options::from_properties(Vec::<(&str, &str)>::new()).unwrap());
    }

    #[test]
    fn test_default_relationship_pattern() {
        let pattern = Options::default().relationship_pattern.unwrap();
        assert_eq!(
            pattern.decompose("Person_ACTED_IN_Movie"),
            Some(("Person", "ACTED_IN", "Movie"))
        );
        assert_eq!(
            pattern.decompose("PERSON_ACTED_IN_MOVIE"),
            Some(("PERSON", "ACTED_IN", "MOVIE"))
        );
        assert_eq!(pattern.decompose("test_write__c"), None);
        assert_eq!(pattern.decompose("Movie"), None);
        assert_eq!(pattern.decompose("Order_Details"), None);
    }

    #[test]
    fn test_from_properties() {
        let options = Options::from_properties([
            ("s2c.prettyPrint", "true"),
            ("s2c.always-escape-names", "TRUE"),
            ("s2c.sqlDialect", "POSTGRES"),
            ("s2c.parseNameCase", "LOWER_IF_UNQUOTED"),
            ("s2c.tableToLabelMappings", "people:Person; movies:Movie"),
            ("s2c.joinColumnsToTypeMappings", "people.movie_id:ACTED_IN"),
            ("s2c.precedence", "10"),
            ("s2c.parseNamedParamPrefix", "$"),
            ("cacheSQLTranslations", "true"),
            ("user", "neo4j"),
        ])
        .unwrap();

        assert!(options.pretty);
        assert!(options.always_escape_names);
        assert!(options.enable_cache);
        assert_eq!(options.dialect, Dialect::Postgres);
        assert_eq!(options.parse_name_case, NameCase::LowerIfUnquoted);
        assert_eq!(options.precedence, 10);
        assert_eq!(options.named_param_prefix.as_deref(), Some("$"));
        assert_debug_snapshot!(options.table_to_label_mappings, @r#"
        {
            "movies": "Movie",
            "people": "Person",
        }
        "#);
        assert_eq!(
            options.join_columns_to_type_mappings["people.movie_id"],
            "ACTED_IN"
        );
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let options = Options::from_properties([("s2c.jooqDiagnosticLogging", "true")]).unwrap();
        assert_eq!(options, Options::default());
    }

    #[test]
    fn test_malformed_values() {
        let err = Options::from_properties([("s2c.prettyPrint", "yes")]).unwrap_err();
        assert_snapshot!(err, @"[E0004] Error: invalid configuration: `yes` is not a valid value for `s2c.prettyPrint`: expected `true` or `false`");

        let err = Options::from_properties([("s2c.tableToLabelMappings", "a:b;c")]).unwrap_err();
        assert_snapshot!(err, @"[E0004] Error: invalid configuration: `a:b;c` is not a valid value for `s2c.tableToLabelMappings`: expected `key:value` pairs separated by `;`");

        let err = Options::from_properties([("s2c.precedence", "high")]).unwrap_err();
        assert_snapshot!(err, @"[E0004] Error: invalid configuration: `high` is not a valid value for `s2c.precedence`: expected an integer");

        let err = Options::from_properties([("s2c.relationshipPattern", "^(?<a>.*)$")]).unwrap_err();
        assert_snapshot!(err, @"[E0004] Error: invalid configuration: relationship pattern `^(?<a>.*)$` has no group named `start`");

        assert!(Options::from_properties([("s2c.sqlDialect", "cobol")]).is_err());
    }

    #[test]
    fn test_options_are_hashable_by_value() {
        use std::collections::hash_map::DefaultHasher;

        let hash = |o: &Options| {
            let mut hasher = DefaultHasher::new();
            o.hash(&mut hasher);
            hasher.finish()
        };
        let a = Options::default().with_table_mapping("movies", "Movie");
        let b = Options::default().with_table_mapping("movies", "Movie");
        assert_eq!(a, b);
        assert_eq!(hash(&a), hash(&b));
        assert_ne!(a, b.with_pretty(true));
    }
}
