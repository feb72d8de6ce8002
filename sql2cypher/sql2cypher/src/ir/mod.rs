//! Intermediate representations: the Cypher AST the translator builds and
//! [crate::codegen] renders.

pub mod cypher;
