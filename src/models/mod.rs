//! Data models for graph interchange.

pub mod graph;
pub mod value;

pub use graph::{
    AttributeDeclaration, AttributeTypeTable, Attributes, DEFAULT_EDGE_LABEL, EdgeRecord,
    ElementKind, GraphDocumentModel, VertexRecord,
};
pub use value::{AttributeType, AttributeValue};
