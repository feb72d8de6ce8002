use std::fmt::{self, Display, Formatter};
use std::sync::Arc;


/// A sql2cypher error. Returned by every stage of a translation.
#[derive(Debug, Clone)]
pub struct Error {
    pub reason: Reason,
    pub hints: Vec<String>,
    /// Machine readable identifier error code eg, "E0001"
    pub code: Option<&'static str>,
}

/// Failure reported by a metadata collaborator. Carried through untouched so
/// callers can downcast to their own error type.
pub type MetadataError = Arc<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Clone)]
pub enum Reason {
    Simple(String),
    /// The SQL text could not be tokenized or parsed.
    Parse {
        sql: String,
        message: String,
    },
    /// Valid SQL that has no Cypher counterpart.
    Unsupported(String),
    /// A table or column could not be mapped onto the graph.
    UnresolvableSchema(String),
    Configuration(String),
    Metadata {
        table: String,
        source: MetadataError,
    },
    Bug {
        details: Option<String>,
    },
}

pub mod codes {
    pub const PARSE: &str = "E0001";
    pub const UNSUPPORTED: &str = "E0002";
    pub const UNRESOLVABLE_SCHEMA: &str = "E0003";
    pub const CONFIGURATION: &str = "E0004";
    pub const METADATA: &str = "E0005";
}

impl Error {
    pub fn new(reason: Reason) -> Self {
        let code = match &reason {
            Reason::Parse { .. } => Some(codes::PARSE),
            Reason::Unsupported(_) => Some(codes::UNSUPPORTED),
            Reason::UnresolvableSchema(_) => Some(codes::UNRESOLVABLE_SCHEMA),
            Reason::Configuration(_) => Some(codes::CONFIGURATION),
            Reason::Metadata { .. } => Some(codes::METADATA),
            Reason::Simple(_) | Reason::Bug { .. } => None,
        };
        Error {
            reason,
            hints: Vec::new(),
            code,
        }
    }

    pub fn new_simple<S: ToString>(reason: S) -> Self {
        Error::new(Reason::Simple(reason.to_string()))
    }

    pub fn new_unsupported<S: ToString>(what: S) -> Self {
        Error::new(Reason::Unsupported(what.to_string()))
    }

    pub fn new_unresolvable<S: ToString>(what: S) -> Self {
        Error::new(Reason::UnresolvableSchema(what.to_string()))
    }

    pub fn new_configuration<S: ToString>(what: S) -> Self {
        Error::new(Reason::Configuration(what.to_string()))
    }

    pub fn new_metadata<S: ToString>(table: S, source: MetadataError) -> Self {
        Error::new(Reason::Metadata {
            table: table.to_string(),
            source,
        })
    }

    /// Used for things that you *think* should never happen, but are not sure.
    pub fn new_assert<S: ToString>(details: S) -> Self {
        Error::new(Reason::Bug {
            details: Some(details.to_string()),
        })
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self.reason, Reason::Unsupported(_))
    }
}

impl Display for Reason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Simple(text) => f.write_str(text),
            Reason::Parse { sql, message } => {
                write!(f, "could not parse `{}`: {message}", sql.trim())
            }
            Reason::Unsupported(what) => f.write_str(what),
            Reason::UnresolvableSchema(what) => f.write_str(what),
            Reason::Configuration(what) => write!(f, "invalid configuration: {what}"),
            Reason::Metadata { table, source } => {
                write!(f, "metadata lookup for `{table}` failed: {source}")
            }
            Reason::Bug { details } => {
                write!(f, "internal translator error")?;
                if let Some(details) = details {
                    write!(f, "; {details}")?;
                }
                Ok(())
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let code = (self.code)
            .map(|c| format!("[{c}] "))
            .unwrap_or_default();

        write!(f, "{}Error: {}", code, &self.reason)?;
        for hint in &self.hints {
            write!(f, "\n↳ Hint: {hint}")?;
        }
        Ok(())
    }
}

// Needed for anyhow
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.reason {
            Reason::Metadata { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

pub trait WithErrorInfo: Sized {
    fn push_hint<S: Into<String>>(self, hint: S) -> Self;

    fn with_hints<S: Into<String>, I: IntoIterator<Item = S>>(self, hints: I) -> Self;

    fn with_code(self, code: &'static str) -> Self;
}

impl WithErrorInfo for Error {
    fn push_hint<S: Into<String>>(mut self, hint: S) -> Self {
        self.hints.push(hint.into());
        self
    }

    fn with_hints<S: Into<String>, I: IntoIterator<Item = S>>(mut self, hints: I) -> Self {
        self.hints = hints.into_iter().map(|x| x.into()).collect();
        self
    }

    fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }
}

impl<T, E: WithErrorInfo> WithErrorInfo for Result<T, E> {
    fn push_hint<S: Into<String>>(self, hint: S) -> Self {
        self.map_err(|e| e.push_hint(hint))
    }

    fn with_hints<S: Into<String>, I: IntoIterator<Item = S>>(self, hints: I) -> Self {
        self.map_err(|e| e.with_hints(hints))
    }

    fn with_code(self, code: &'static str) -> Self {
        self.map_err(|e| e.with_code(code))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
