//! Schema descriptors for record types
//!
//! A record type declares its schema explicitly through
//! [`Record::schema`](crate::codec::Record::schema): the names of its fields,
//! which of them are indexed (each with an accessor), and optionally the
//! primary namespace name. Building the declaration validates it and yields
//! a [`Schema`], whose [`SchemaDescriptor`] is immutable from then on.
//!
//! ## Namespace layout
//!
//! ```text
//! <primary_namespace>            primary key  -> encoded record
//! <primary_namespace>/<field>    index value  -> encoded KeySet
//! ```
//!
//! Schemas are derived once per record type per process and cached in a
//! global registry (see [`Schema::cached`]). Re-deriving is deterministic.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use crate::codec::{self, Record};
use crate::error::{Error, Result};

/// Static description of a record type's storage layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    primary_namespace: String,
    indexed_fields: Vec<String>,
}

impl SchemaDescriptor {
    /// Name of the namespace holding the records
    pub fn primary_namespace(&self) -> &str {
        &self.primary_namespace
    }

    /// Indexed field names, in declaration order
    pub fn indexed_fields(&self) -> &[String] {
        &self.indexed_fields
    }

    /// True if `field` is declared as indexed
    pub fn is_indexed(&self, field: &str) -> bool {
        self.indexed_fields.iter().any(|f| f == field)
    }
}

type Accessor<R> = Box<dyn Fn(&R) -> Result<Vec<u8>> + Send + Sync>;

struct IndexedField<R> {
    name: String,
    accessor: Accessor<R>,
}

/// Builder for a record type's schema declaration
pub struct SchemaBuilder<R> {
    namespace: Option<String>,
    fields: Vec<String>,
    indexes: Vec<IndexedField<R>>,
}

impl<R: 'static> SchemaBuilder<R> {
    /// Start an empty declaration
    pub fn new() -> Self {
        Self {
            namespace: None,
            fields: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Declare the record's field names
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Use an explicit primary namespace name instead of the type name
    pub fn namespace(mut self, name: impl Into<String>) -> Self {
        self.namespace = Some(name.into());
        self
    }

    /// Mark `field` as indexed
    ///
    /// The accessor returns the field's value in its native type; it is
    /// encoded with the record codec, so lookups must pass the same type.
    pub fn index<V, F>(mut self, field: impl Into<String>, accessor: F) -> Self
    where
        V: Serialize,
        F: Fn(&R) -> V + Send + Sync + 'static,
    {
        self.indexes.push(IndexedField {
            name: field.into(),
            accessor: Box::new(move |record| codec::encode(&accessor(record))),
        });
        self
    }

    /// Validate the declaration
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if:
    /// - no fields are declared and no namespace name is given
    /// - the namespace name (explicit or derived) is empty
    /// - a field name is empty
    /// - an indexed field is not among the declared fields
    /// - a field is indexed twice
    pub fn build(self) -> Result<Schema<R>> {
        if self.fields.is_empty() && self.namespace.is_none() {
            return Err(Error::SchemaError(format!(
                "{} declares no fields and no namespace name",
                std::any::type_name::<R>()
            )));
        }

        let primary_namespace = match self.namespace {
            Some(name) => name,
            None => derive_namespace(std::any::type_name::<R>()),
        };
        if primary_namespace.is_empty() {
            return Err(Error::SchemaError("primary namespace name is empty".to_string()));
        }

        if self.fields.iter().any(|f| f.is_empty()) {
            return Err(Error::SchemaError(format!(
                "{} declares an empty field name",
                primary_namespace
            )));
        }

        let mut indexed_fields: Vec<String> = Vec::with_capacity(self.indexes.len());
        for index in &self.indexes {
            if !self.fields.contains(&index.name) {
                return Err(Error::SchemaError(format!(
                    "indexed field '{}' does not exist on {}",
                    index.name, primary_namespace
                )));
            }
            if indexed_fields.contains(&index.name) {
                return Err(Error::SchemaError(format!(
                    "field '{}' is indexed more than once on {}",
                    index.name, primary_namespace
                )));
            }
            indexed_fields.push(index.name.clone());
        }

        debug!(
            target: "strata::schema",
            namespace = %primary_namespace,
            indexes = ?indexed_fields,
            "Schema built"
        );

        Ok(Schema {
            descriptor: SchemaDescriptor {
                primary_namespace,
                indexed_fields,
            },
            accessors: self.indexes.into_iter().map(|i| i.accessor).collect(),
        })
    }
}

impl<R: 'static> Default for SchemaBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip module paths from every path in a type name
///
/// Generic arguments are kept so that each instantiation of a generic
/// record type gets its own namespace: `my_app::model::Customer` becomes
/// `Customer`, `my_app::Tagged<alloc::string::String, u64>` becomes
/// `Tagged<String,u64>`.
fn derive_namespace(type_name: &str) -> String {
    let mut name = String::with_capacity(type_name.len());
    let mut path = String::new();
    let mut after_comma = false;
    for c in type_name.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            path.push(c);
            after_comma = false;
            continue;
        }
        name.push_str(path.rsplit("::").next().unwrap_or(&path));
        path.clear();
        if c == ' ' && after_comma {
            continue;
        }
        after_comma = c == ',';
        name.push(c);
    }
    name.push_str(path.rsplit("::").next().unwrap_or(&path));
    name
}

/// A validated schema: descriptor plus index accessors
pub struct Schema<R> {
    descriptor: SchemaDescriptor,
    accessors: Vec<Accessor<R>>,
}

impl<R> Schema<R> {
    /// The immutable descriptor
    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    /// Encoded value of an indexed field on `record`
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if `field` is not indexed, `CodecError` if the
    /// value cannot be encoded.
    pub fn index_value(&self, field: &str, record: &R) -> Result<Vec<u8>> {
        let position = self
            .descriptor
            .indexed_fields
            .iter()
            .position(|f| f == field)
            .ok_or_else(|| {
                Error::SchemaError(format!(
                    "field '{}' is not indexed on {}",
                    field, self.descriptor.primary_namespace
                ))
            })?;
        (self.accessors[position])(record)
    }

    /// Encoded values of every indexed field, in declaration order
    pub fn index_values(&self, record: &R) -> Result<Vec<(&str, Vec<u8>)>> {
        self.descriptor
            .indexed_fields
            .iter()
            .zip(&self.accessors)
            .map(|(field, accessor)| Ok((field.as_str(), accessor(record)?)))
            .collect()
    }
}

impl<R: Record> Schema<R> {
    /// Build the schema declared by `R`
    pub fn derive() -> Result<Self> {
        R::schema().build()
    }

    /// The process-wide schema for `R`, built on first use
    ///
    /// A failed build is not cached; the next call tries again and fails
    /// the same way.
    pub fn cached() -> Result<Arc<Self>> {
        let type_id = TypeId::of::<R>();
        if let Some(schema) = lookup::<R>(type_id) {
            return Ok(schema);
        }

        let built = Arc::new(Self::derive()?);
        let mut registry = SCHEMA_REGISTRY.write();
        let entry = registry
            .entry(type_id)
            .or_insert_with(|| built.clone() as Arc<dyn Any + Send + Sync>);
        Ok(entry.clone().downcast::<Self>().unwrap_or(built))
    }
}

impl<R> fmt::Debug for Schema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

/// Global registry of built schemas, keyed by record type
static SCHEMA_REGISTRY: Lazy<RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

fn lookup<R: Record>(type_id: TypeId) -> Option<Arc<Schema<R>>> {
    let registry = SCHEMA_REGISTRY.read();
    registry
        .get(&type_id)
        .cloned()
        .and_then(|schema| schema.downcast::<Schema<R>>().ok())
}
