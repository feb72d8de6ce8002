mod id_gen;

pub use id_gen::{ParameterNameGenerator, UniqueNameGenerator};

/// True for names that can be written in Cypher without backticks.
pub(crate) fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}
