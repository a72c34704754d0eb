//! Graph document model.
//!
//! Records produced by format readers and consumed by writers and the import
//! pipeline. Records are transient: they live for one pipeline invocation and
//! are either persisted into a store or dropped.

use super::value::{AttributeType, AttributeValue};
use crate::Result;
use crate::io::traits::{ImportEvent, ImportSource};
use std::collections::BTreeMap;
use std::fmt;

/// Attribute map of a single element, ordered by key.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Label used for edges whose document omits one.
pub const DEFAULT_EDGE_LABEL: &str = "E";

/// Kind of graph element an attribute belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    /// A vertex (GraphML `node`).
    Vertex,
    /// An edge.
    Edge,
}

impl ElementKind {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Edge => "edge",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vertex as read from (or written to) an interchange document.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexRecord {
    /// External identifier, unique within one document.
    pub id: String,
    /// Optional label (store class).
    pub label: Option<String>,
    /// Attribute values.
    pub attributes: Attributes,
}

impl VertexRecord {
    /// Creates a vertex with no label and no attributes.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            attributes: Attributes::new(),
        }
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Adds an attribute, overwriting any previous value for the key.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// An edge as read from (or written to) an interchange document.
///
/// Endpoints are external vertex identifiers; they are resolved by the import
/// pipeline, never by readers.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    /// External identifier.
    pub id: String,
    /// External identifier of the source vertex.
    pub source: String,
    /// External identifier of the target vertex.
    pub target: String,
    /// Edge label.
    pub label: String,
    /// Attribute values.
    pub attributes: Attributes,
}

impl EdgeRecord {
    /// Creates an edge with the given endpoints and label.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: label.into(),
            attributes: Attributes::new(),
        }
    }

    /// Adds an attribute, overwriting any previous value for the key.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// A declared attribute key.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDeclaration {
    /// Attribute name as stored on elements.
    pub name: String,
    /// Declared type used for coercion.
    pub ty: AttributeType,
    /// Declared default, used when an element carries an empty value.
    pub default: Option<AttributeValue>,
}

impl AttributeDeclaration {
    /// Creates a declaration without a default.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: AttributeType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    /// Value used for an element that carries the key with empty content.
    ///
    /// Empty content is a real value for string keys, so they read as `""`.
    /// Other types fall back to the declared default, then the type default.
    #[must_use]
    pub fn empty_value(&self) -> AttributeValue {
        if self.ty == AttributeType::String {
            return AttributeValue::String(String::new());
        }
        self.default
            .clone()
            .unwrap_or_else(|| self.ty.default_value())
    }
}

/// Declared attribute types, scoped separately for vertices and edges.
///
/// Populated from document metadata before any element is parsed. Readers
/// hand a copy to the pipeline in [`ImportEvent::MetadataParsed`] and do not
/// change it afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeTypeTable {
    vertex: BTreeMap<String, AttributeDeclaration>,
    edge: BTreeMap<String, AttributeDeclaration>,
}

impl AttributeTypeTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    const fn scope(&self, kind: ElementKind) -> &BTreeMap<String, AttributeDeclaration> {
        match kind {
            ElementKind::Vertex => &self.vertex,
            ElementKind::Edge => &self.edge,
        }
    }

    const fn scope_mut(&mut self, kind: ElementKind) -> &mut BTreeMap<String, AttributeDeclaration> {
        match kind {
            ElementKind::Vertex => &mut self.vertex,
            ElementKind::Edge => &mut self.edge,
        }
    }

    /// Declares a key, replacing any earlier declaration with the same name.
    pub fn declare(&mut self, kind: ElementKind, declaration: AttributeDeclaration) {
        self.scope_mut(kind)
            .insert(declaration.name.clone(), declaration);
    }

    /// Looks up a declaration.
    #[must_use]
    pub fn get(&self, kind: ElementKind, name: &str) -> Option<&AttributeDeclaration> {
        self.scope(kind).get(name)
    }

    /// Returns the declared type of a key.
    #[must_use]
    pub fn type_of(&self, kind: ElementKind, name: &str) -> Option<AttributeType> {
        self.get(kind, name).map(|d| d.ty)
    }

    /// Iterates declarations of one element kind in name order.
    pub fn declarations(&self, kind: ElementKind) -> impl Iterator<Item = &AttributeDeclaration> {
        self.scope(kind).values()
    }

    /// Returns the total number of declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertex.len() + self.edge.len()
    }

    /// Returns whether no key is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertex.is_empty() && self.edge.is_empty()
    }

    /// Records the type of an observed value, widening on conflict.
    ///
    /// Integer and float widen to float; any other mix widens to string.
    /// Used when building declarations from data rather than from a document.
    pub fn observe(&mut self, kind: ElementKind, name: &str, value: &AttributeValue) {
        let found = value.attribute_type();
        let scope = self.scope_mut(kind);
        match scope.get_mut(name) {
            None => {
                scope.insert(name.to_string(), AttributeDeclaration::new(name, found));
            },
            Some(existing) if existing.ty == found => {},
            Some(existing) => {
                existing.ty = match (existing.ty, found) {
                    (AttributeType::Integer, AttributeType::Float)
                    | (AttributeType::Float, AttributeType::Integer) => AttributeType::Float,
                    _ => AttributeType::String,
                };
            },
        }
    }
}

/// A fully materialized graph document.
///
/// Readers stream; this model is for callers that want the whole document,
/// such as tests and small conversions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphDocumentModel {
    /// Declared attribute types.
    pub types: AttributeTypeTable,
    /// Vertices in document order.
    pub vertices: Vec<VertexRecord>,
    /// Edges in document order.
    pub edges: Vec<EdgeRecord>,
}

impl GraphDocumentModel {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains an import source into a model.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by the source.
    pub fn from_source(source: &mut dyn ImportSource) -> Result<Self> {
        let mut model = Self::new();
        while let Some(event) = source.next_event()? {
            match event {
                ImportEvent::MetadataParsed(types) => model.types = types,
                ImportEvent::VertexParsed(vertex) => model.vertices.push(vertex),
                ImportEvent::EdgeParsed(edge) => model.edges.push(edge),
            }
        }
        Ok(model)
    }

    /// Adds a vertex.
    #[must_use]
    pub fn with_vertex(mut self, vertex: VertexRecord) -> Self {
        self.vertices.push(vertex);
        self
    }

    /// Adds an edge.
    #[must_use]
    pub fn with_edge(mut self, edge: EdgeRecord) -> Self {
        self.edges.push(edge);
        self
    }

    /// Declares every attribute key present on the model's elements.
    ///
    /// Existing declarations are kept; undeclared keys get the type of their
    /// values (widened on conflict).
    pub fn declare_observed_types(&mut self) {
        let mut observed = AttributeTypeTable::new();
        for vertex in &self.vertices {
            for (key, value) in &vertex.attributes {
                observed.observe(ElementKind::Vertex, key, value);
            }
        }
        for edge in &self.edges {
            for (key, value) in &edge.attributes {
                observed.observe(ElementKind::Edge, key, value);
            }
        }
        for kind in [ElementKind::Vertex, ElementKind::Edge] {
            for declaration in observed.declarations(kind) {
                if self.types.get(kind, &declaration.name).is_none() {
                    self.types.declare(kind, declaration.clone());
                }
            }
        }
    }

    /// Compares two models as graphs, ignoring element order.
    ///
    /// Vertex sets, edge sets, labels and attribute key/value pairs must match.
    /// Declared types are not compared.
    #[must_use]
    pub fn same_graph(&self, other: &Self) -> bool {
        if self.vertices.len() != other.vertices.len() || self.edges.len() != other.edges.len() {
            return false;
        }

        let mut ours: Vec<&VertexRecord> = self.vertices.iter().collect();
        let mut theirs: Vec<&VertexRecord> = other.vertices.iter().collect();
        ours.sort_by(|a, b| a.id.cmp(&b.id));
        theirs.sort_by(|a, b| a.id.cmp(&b.id));
        if ours != theirs {
            return false;
        }

        let mut ours: Vec<&EdgeRecord> = self.edges.iter().collect();
        let mut theirs: Vec<&EdgeRecord> = other.edges.iter().collect();
        ours.sort_by(|a, b| a.id.cmp(&b.id));
        theirs.sort_by(|a, b| a.id.cmp(&b.id));
        ours == theirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_empty_value() {
        let plain = AttributeDeclaration::new("age", AttributeType::Integer);
        assert_eq!(plain.empty_value(), AttributeValue::Integer(0));

        let with_default = AttributeDeclaration {
            default: Some(AttributeValue::Integer(18)),
            ..plain
        };
        assert_eq!(with_default.empty_value(), AttributeValue::Integer(18));

        let nick = AttributeDeclaration {
            default: Some(AttributeValue::from("anon")),
            ..AttributeDeclaration::new("nick", AttributeType::String)
        };
        assert_eq!(nick.empty_value(), AttributeValue::from(""));
    }

    #[test]
    fn test_type_table_scopes_are_separate() {
        let mut table = AttributeTypeTable::new();
        table.declare(
            ElementKind::Vertex,
            AttributeDeclaration::new("weight", AttributeType::Integer),
        );
        table.declare(
            ElementKind::Edge,
            AttributeDeclaration::new("weight", AttributeType::Float),
        );

        assert_eq!(
            table.type_of(ElementKind::Vertex, "weight"),
            Some(AttributeType::Integer)
        );
        assert_eq!(
            table.type_of(ElementKind::Edge, "weight"),
            Some(AttributeType::Float)
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_observe_widens_conflicting_types() {
        let mut table = AttributeTypeTable::new();
        table.observe(ElementKind::Vertex, "n", &AttributeValue::Integer(1));
        table.observe(ElementKind::Vertex, "n", &AttributeValue::Float(1.5));
        assert_eq!(
            table.type_of(ElementKind::Vertex, "n"),
            Some(AttributeType::Float)
        );

        table.observe(ElementKind::Vertex, "n", &AttributeValue::Boolean(true));
        assert_eq!(
            table.type_of(ElementKind::Vertex, "n"),
            Some(AttributeType::String)
        );
    }

    #[test]
    fn test_same_graph_ignores_order() {
        let a = GraphDocumentModel::new()
            .with_vertex(VertexRecord::new("1").with_attribute("name", "marko"))
            .with_vertex(VertexRecord::new("2"))
            .with_edge(EdgeRecord::new("7", "1", "2", "knows").with_attribute("weight", 0.5));
        let b = GraphDocumentModel::new()
            .with_edge(EdgeRecord::new("7", "1", "2", "knows").with_attribute("weight", 0.5))
            .with_vertex(VertexRecord::new("2"))
            .with_vertex(VertexRecord::new("1").with_attribute("name", "marko"));
        assert!(a.same_graph(&b));

        let c = b
            .clone()
            .with_vertex(VertexRecord::new("3").with_label("Person"));
        assert!(!a.same_graph(&c));
    }

    #[test]
    fn test_declare_observed_types_keeps_existing() {
        let mut model = GraphDocumentModel::new()
            .with_vertex(VertexRecord::new("1").with_attribute("age", 29_i64));
        model.types.declare(
            ElementKind::Vertex,
            AttributeDeclaration::new("age", AttributeType::Float),
        );
        model.declare_observed_types();
        assert_eq!(
            model.types.type_of(ElementKind::Vertex, "age"),
            Some(AttributeType::Float)
        );
    }
}
