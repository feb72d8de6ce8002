//! Decides whether a table is a node label or a relationship between two
//! labels.

use std::collections::{BTreeSet, HashMap};

use enum_as_inner::EnumAsInner;
use serde::Serialize;

use crate::ast::{ColumnRef, TableRef};
use crate::error::MetadataError;
use crate::{Error, Options, Result};

/// Graph metadata: which properties exist and which tables stand for
/// relationships.
///
/// Implemented by whoever has access to the database; [StaticMetadata] is an
/// in-memory implementation.
pub trait MetadataLookup {
    /// Columns of a label, relationship type or relationship table, in
    /// declaration order. Unknown names have no columns.
    fn columns_of(&self, table: &str) -> Result<Vec<String>, MetadataError>;

    /// Returns the relationship a table stands for, if it is a virtual
    /// relationship table.
    fn relationship_table(&self, table: &str) -> Result<Option<RelationshipTable>, MetadataError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RelationshipTable {
    pub lhs_label: String,
    pub rel_type: String,
    pub rhs_label: String,
}

impl RelationshipTable {
    pub fn new<S: Into<String>>(lhs_label: S, rel_type: S, rhs_label: S) -> Self {
        RelationshipTable {
            lhs_label: lhs_label.into(),
            rel_type: rel_type.into(),
            rhs_label: rhs_label.into(),
        }
    }
}

/// [MetadataLookup] over fixed data. Names are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    columns: HashMap<String, Vec<String>>,
    relationship_tables: HashMap<String, RelationshipTable>,
}

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns<S, I, C>(mut self, table: S, columns: I) -> Self
    where
        S: AsRef<str>,
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.columns.insert(
            table.as_ref().to_lowercase(),
            columns.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn with_relationship_table<S: AsRef<str>>(
        mut self,
        table: S,
        relationship: RelationshipTable,
    ) -> Self {
        (self.relationship_tables).insert(table.as_ref().to_lowercase(), relationship);
        self
    }
}

impl MetadataLookup for StaticMetadata {
    fn columns_of(&self, table: &str) -> Result<Vec<String>, MetadataError> {
        Ok(self
            .columns
            .get(&table.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    fn relationship_table(&self, table: &str) -> Result<Option<RelationshipTable>, MetadataError> {
        Ok(self.relationship_tables.get(&table.to_lowercase()).cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner, Serialize)]
pub enum SchemaMapping {
    Node { label: String },
    Relationship(RelationshipMapping),
}

impl SchemaMapping {
    /// The node label, or the relationship type.
    pub fn label_or_type(&self) -> &str {
        match self {
            SchemaMapping::Node { label } => label,
            SchemaMapping::Relationship(rel) => &rel.rel_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RelationshipMapping {
    pub rel_type: String,
    pub lhs_label: String,
    pub rhs_label: String,
    pub lhs_columns: BTreeSet<String>,
    pub rhs_columns: BTreeSet<String>,
    /// Informational; columns owned by neither endpoint belong to the
    /// relationship anyway.
    pub rel_columns: BTreeSet<String>,
}

/// Which element of a relationship table owns a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Owner {
    Lhs,
    Rel,
    Rhs,
}

impl RelationshipMapping {
    /// Routes a column of a relationship table to one of its elements.
    ///
    /// Only a qualifier naming a label or the type picks the element; the
    /// table's own name or alias leaves it to the known columns.
    pub fn owner_of(&self, column: &ColumnRef) -> Owner {
        if let Some(qualifier) = &column.qualifier {
            let is = |name: &str| qualifier.eq_ignore_ascii_case(name);

            if is(&self.lhs_label) {
                return Owner::Lhs;
            }
            if is(&self.rhs_label) {
                return Owner::Rhs;
            }
            if is(&self.rel_type) {
                return Owner::Rel;
            }
        }

        if self.lhs_columns.contains(&column.name) {
            Owner::Lhs
        } else if self.rhs_columns.contains(&column.name) {
            Owner::Rhs
        } else {
            Owner::Rel
        }
    }
}

/// Maps a single table reference, first match wins:
/// an inline annotation, the table to label mappings, a relationship table
/// known to `metadata`, the relationship pattern, or the table name itself.
pub fn resolve(
    table: &TableRef,
    options: &Options,
    metadata: Option<&dyn MetadataLookup>,
) -> Result<SchemaMapping> {
    if let Some(annotation) = &table.annotation {
        match (&annotation.start, &annotation.rel_type, &annotation.end) {
            (Some(start), Some(rel_type), Some(end)) => {
                let triple = RelationshipTable::new(start, rel_type, end);
                return relationship(&table.name, triple, metadata);
            }
            (_, Some(rel_type), _) if annotation.label.is_none() => {
                return Ok(SchemaMapping::Node {
                    label: rel_type.clone(),
                });
            }
            _ => {}
        }
        if let Some(label) = &annotation.label {
            return Ok(SchemaMapping::Node {
                label: label.clone(),
            });
        }
    }

    let mapped = (options.table_to_label_mappings.iter())
        .find(|(t, _)| t.eq_ignore_ascii_case(&table.name));
    if let Some((_, label)) = mapped {
        return Ok(SchemaMapping::Node {
            label: label.clone(),
        });
    }

    if let Some(metadata) = metadata {
        let triple = (metadata.relationship_table(&table.name))
            .map_err(|e| Error::new_metadata(&table.name, e))?;
        if let Some(triple) = triple {
            return relationship(&table.name, triple, Some(metadata));
        }
    }

    if let Some(pattern) = &options.relationship_pattern {
        if let Some((start, rel_type, end)) = pattern.decompose(&table.name) {
            let triple = RelationshipTable::new(start, rel_type, end);
            return relationship(&table.name, triple, metadata);
        }
    }

    Ok(SchemaMapping::Node {
        label: table.name.clone(),
    })
}

fn relationship(
    table: &str,
    triple: RelationshipTable,
    metadata: Option<&dyn MetadataLookup>,
) -> Result<SchemaMapping> {
    if [&triple.lhs_label, &triple.rel_type, &triple.rhs_label]
        .iter()
        .any(|name| name.trim().is_empty())
    {
        return Err(Error::new_unresolvable(format!(
            "table `{table}` maps to an incomplete relationship: {triple:?}"
        )));
    }

    let mut mapping = RelationshipMapping::default();
    if let Some(metadata) = metadata {
        mapping.lhs_columns = columns_of(metadata, &triple.lhs_label)?.into_iter().collect();
        mapping.rhs_columns = columns_of(metadata, &triple.rhs_label)?.into_iter().collect();
        mapping.rel_columns = columns_of(metadata, table)?.into_iter().collect();
    }
    mapping.rel_type = triple.rel_type;
    mapping.lhs_label = triple.lhs_label;
    mapping.rhs_label = triple.rhs_label;

    Ok(SchemaMapping::Relationship(mapping))
}

pub(crate) fn columns_of(metadata: &dyn MetadataLookup, name: &str) -> Result<Vec<String>> {
    metadata
        .columns_of(name)
        .map_err(|e| Error::new_metadata(name, e))
}

/// A table of the statement, together with the way it maps to the graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTable {
    pub table: TableRef,
    pub mapping: SchemaMapping,
    /// Lower-cased binding name, used as the Cypher variable.
    pub variable: String,
    /// Columns known from metadata, in declaration order.
    pub columns: Option<Vec<String>>,
    /// Variables of the nodes this table connects, when it is the middle
    /// table of a join.
    pub endpoints: Option<(String, String)>,
}

impl ResolvedTable {
    /// Whether `qualifier` refers to this table.
    pub fn is_bound_to(&self, qualifier: &str) -> bool {
        match &self.table.alias {
            Some(alias) => alias.eq_ignore_ascii_case(qualifier),
            None => self.table.name.eq_ignore_ascii_case(qualifier),
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        (self.columns.iter().flatten()).any(|c| c == column)
    }
}

/// Every table reference of a statement, resolved once, in the order they
/// appear.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolvedSchema {
    pub tables: Vec<ResolvedTable>,
    /// Whether metadata was available while resolving.
    pub has_metadata: bool,
}

impl ResolvedSchema {
    pub fn build<'a, I>(
        tables: I,
        options: &Options,
        metadata: Option<&dyn MetadataLookup>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = &'a TableRef>,
    {
        let mut resolved = Vec::new();
        for table in tables {
            let mapping = resolve(table, options, metadata)?;
            let columns = match (metadata, &mapping) {
                (None, _) => None,
                (Some(metadata), SchemaMapping::Node { label }) => {
                    Some(columns_of(metadata, label)?)
                }
                (Some(metadata), SchemaMapping::Relationship(_)) => {
                    Some(columns_of(metadata, &table.name)?)
                }
            };

            resolved.push(ResolvedTable {
                variable: table.binding_name().to_lowercase(),
                table: table.clone(),
                mapping,
                columns,
                endpoints: None,
            });
        }
        log::debug!("resolved schema: {resolved:?}");

        Ok(ResolvedSchema {
            tables: resolved,
            has_metadata: metadata.is_some(),
        })
    }

    pub fn find(&self, qualifier: &str) -> Option<&ResolvedTable> {
        self.tables.iter().find(|t| t.is_bound_to(qualifier))
    }

    pub fn get(&self, table: &TableRef) -> Option<&ResolvedTable> {
        self.tables.iter().find(|t| &t.table == table)
    }
}
