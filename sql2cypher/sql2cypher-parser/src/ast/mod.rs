//! The relational model: a closed subset of SQL, produced by [crate::parse].

mod expr;
mod stmt;

pub use expr::*;
pub use stmt::*;
