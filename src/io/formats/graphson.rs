//! GraphSON format adapter for import/export.
//!
//! Layout read and written:
//!
//! ```json
//! {
//!   "mode": "EXTENDED",
//!   "vertices": [
//!     {"_id": "1", "_type": "vertex", "name": {"type": "string", "value": "marko"}}
//!   ],
//!   "edges": [
//!     {"_id": "7", "_type": "edge", "_outV": "1", "_inV": "2", "_label": "knows"}
//!   ]
//! }
//! ```
//!
//! `NORMAL` and `COMPACT` documents carry plain JSON values whose type is
//! inferred; `EXTENDED` documents wrap each value in `{"type", "value"}`.
//! The writer always produces `EXTENDED` so integer and float columns keep
//! their declared types.

use super::json_stream::JsonStream;
use super::{ReadOptions, WriteMode};
use crate::io::traits::{ExportSink, ImportEvent, ImportSource};
use crate::models::{
    AttributeTypeTable, AttributeValue, Attributes, DEFAULT_EDGE_LABEL, EdgeRecord, ElementKind,
    VertexRecord,
};
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;

const ID: &str = "_id";
const TYPE: &str = "_type";
const LABEL: &str = "_label";
const OUT_V: &str = "_outV";
const IN_V: &str = "_inV";

const fn is_reserved(key: &str) -> bool {
    matches!(key.as_bytes(), b"_id" | b"_type" | b"_label" | b"_outV" | b"_inV")
}

/// How attribute values are encoded in a GraphSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GraphSonMode {
    /// Plain JSON values, types inferred.
    #[default]
    Normal,
    /// Plain JSON values with reserved keys trimmed.
    Compact,
    /// Values wrapped in `{"type": .., "value": ..}`.
    Extended,
}

impl GraphSonMode {
    /// Returns the name written in the `mode` member.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Compact => "COMPACT",
            Self::Extended => "EXTENDED",
        }
    }
}

impl FromStr for GraphSonMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "NORMAL" => Ok(Self::Normal),
            "COMPACT" => Ok(Self::Compact),
            "EXTENDED" => Ok(Self::Extended),
            _ => Err(Error::parse(format!("unknown GraphSON mode '{s}'"))),
        }
    }
}

impl fmt::Display for GraphSonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Import
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    Start,
    TopLevel,
    Vertices,
    Edges,
    Done,
}

/// GraphSON import source.
///
/// GraphSON has no key declarations, so the metadata event carries an empty
/// table and is emitted as soon as the top-level object opens. Members other
/// than `mode`, `vertices` and `edges` are skipped.
pub struct GraphSonImportSource<R: BufRead> {
    stream: JsonStream<R>,
    options: ReadOptions,
    mode: GraphSonMode,
    state: ReaderState,
    first_member: bool,
    first_item: bool,
    edge_ordinal: usize,
}

impl<R: BufRead> GraphSonImportSource<R> {
    /// Creates a new GraphSON import source.
    #[must_use]
    pub fn new(reader: R, options: ReadOptions) -> Self {
        Self {
            stream: JsonStream::new(reader),
            options,
            mode: GraphSonMode::default(),
            state: ReaderState::Start,
            first_member: true,
            first_item: true,
            edge_ordinal: 0,
        }
    }

    fn read_member(&mut self) -> Result<Option<ImportEvent>> {
        loop {
            let Some(key) = self.stream.next_key(&mut self.first_member)? else {
                self.state = ReaderState::Done;
                return Ok(None);
            };
            match key.as_str() {
                "mode" => {
                    let value = self.stream.parse_value()?;
                    let name = value
                        .as_str()
                        .ok_or_else(|| self.stream.error("mode must be a string"))?;
                    self.mode = name.parse()?;
                },
                "vertices" => {
                    self.stream.expect(b'[')?;
                    self.first_item = true;
                    self.state = ReaderState::Vertices;
                    return self.next_event();
                },
                "edges" => {
                    self.stream.expect(b'[')?;
                    self.first_item = true;
                    self.state = ReaderState::Edges;
                    return self.next_event();
                },
                other => {
                    tracing::trace!(member = other, "skipping GraphSON member");
                    self.stream.skip_value()?;
                },
            }
        }
    }

    fn read_element(&mut self, kind: ElementKind) -> Result<Option<ImportEvent>> {
        if !self.stream.next_item(&mut self.first_item)? {
            self.state = ReaderState::TopLevel;
            return self.read_member();
        }
        let Value::Object(object) = self.stream.parse_value()? else {
            return Err(self.stream.error(format!("{kind} must be a JSON object")));
        };
        let event = match kind {
            ElementKind::Vertex => ImportEvent::VertexParsed(self.vertex_from(object)?),
            ElementKind::Edge => ImportEvent::EdgeParsed(self.edge_from(object)?),
        };
        Ok(Some(event))
    }

    fn vertex_from(&self, mut object: Map<String, Value>) -> Result<VertexRecord> {
        let id = match object.remove(ID) {
            Some(value) => self.identifier(ID, &value)?,
            None => return Err(self.stream.error("vertex without _id")),
        };
        let mut label = self.optional_string(&mut object, LABEL)?;
        object.remove(TYPE);

        let raw = self.raw_attributes(ElementKind::Vertex, object)?;
        if label.is_none() {
            if let Some(key) = self.options.vertex_label_key.as_deref() {
                label = raw.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.to_text());
            }
        }

        Ok(VertexRecord {
            id,
            label,
            attributes: self.options.strategies.apply_all(ElementKind::Vertex, raw),
        })
    }

    fn edge_from(&mut self, mut object: Map<String, Value>) -> Result<EdgeRecord> {
        let ordinal = self.edge_ordinal;
        self.edge_ordinal += 1;

        let id = match object.remove(ID) {
            Some(value) => self.identifier(ID, &value)?,
            None => format!("e{ordinal}"),
        };
        let source = match object.remove(OUT_V) {
            Some(value) => self.identifier(OUT_V, &value)?,
            None => return Err(self.stream.error(format!("edge '{id}' without _outV"))),
        };
        let target = match object.remove(IN_V) {
            Some(value) => self.identifier(IN_V, &value)?,
            None => return Err(self.stream.error(format!("edge '{id}' without _inV"))),
        };
        let label = self
            .optional_string(&mut object, LABEL)?
            .unwrap_or_else(|| DEFAULT_EDGE_LABEL.to_string());
        object.remove(TYPE);

        let raw = self.raw_attributes(ElementKind::Edge, object)?;
        Ok(EdgeRecord {
            id,
            source,
            target,
            label,
            attributes: self.options.strategies.apply_all(ElementKind::Edge, raw),
        })
    }

    /// Identifiers may be strings or numbers; numbers keep their JSON text.
    fn identifier(&self, key: &str, value: &Value) -> Result<String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            // EXTENDED writers sometimes wrap identifiers too.
            Value::Object(o) if o.contains_key("value") => self.identifier(key, &o["value"]),
            _ => Err(self
                .stream
                .error(format!("{key} must be a string or number"))),
        }
    }

    fn optional_string(&self, object: &mut Map<String, Value>, key: &str) -> Result<Option<String>> {
        match object.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(self.stream.error(format!("{key} must be a string"))),
        }
    }

    fn raw_attributes(
        &self,
        kind: ElementKind,
        object: Map<String, Value>,
    ) -> Result<Vec<(String, AttributeValue)>> {
        let mut raw = Vec::with_capacity(object.len());
        for (key, value) in object {
            let decoded = match self.mode {
                GraphSonMode::Extended => decode_typed(&value),
                GraphSonMode::Normal | GraphSonMode::Compact => AttributeValue::from_json(&value),
            }
            .map_err(|e| self.stream.error(format!("{kind} attribute '{key}': {e}")))?;
            if let Some(value) = decoded {
                raw.push((key, value));
            }
        }
        Ok(raw)
    }
}

/// Decodes an `EXTENDED` value. Plain values fall back to inference.
fn decode_typed(value: &Value) -> Result<Option<AttributeValue>> {
    let Value::Object(typed) = value else {
        return AttributeValue::from_json(value);
    };
    let (Some(Value::String(ty)), Some(inner)) = (typed.get("type"), typed.get("value")) else {
        return Err(Error::parse("typed value needs 'type' and 'value'"));
    };
    if inner.is_null() {
        return Ok(None);
    }

    let decoded = match ty.to_lowercase().as_str() {
        "string" => AttributeValue::String(match inner {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
        "integer" | "int" | "long" | "short" | "byte" => inner
            .as_i64()
            .map(AttributeValue::Integer)
            .ok_or_else(|| Error::parse(format!("invalid {ty} value {inner}")))?,
        "float" | "double" => inner
            .as_f64()
            .map(AttributeValue::Float)
            .ok_or_else(|| Error::parse(format!("invalid {ty} value {inner}")))?,
        "boolean" => inner
            .as_bool()
            .map(AttributeValue::Boolean)
            .ok_or_else(|| Error::parse(format!("invalid boolean value {inner}")))?,
        "list" | "array" | "set" => {
            let Value::Array(items) = inner else {
                return Err(Error::parse(format!("invalid list value {inner}")));
            };
            let mut list = Vec::with_capacity(items.len());
            for item in items {
                if let Some(v) = decode_typed(item)? {
                    list.push(v);
                }
            }
            AttributeValue::List(list)
        },
        other => return Err(Error::parse(format!("unsupported value type '{other}'"))),
    };
    Ok(Some(decoded))
}

impl<R: BufRead> ImportSource for GraphSonImportSource<R> {
    fn next_event(&mut self) -> Result<Option<ImportEvent>> {
        match self.state {
            ReaderState::Start => {
                self.stream.expect(b'{')?;
                self.state = ReaderState::TopLevel;
                Ok(Some(ImportEvent::MetadataParsed(AttributeTypeTable::new())))
            },
            ReaderState::TopLevel => self.read_member(),
            ReaderState::Vertices => self.read_element(ElementKind::Vertex),
            ReaderState::Edges => self.read_element(ElementKind::Edge),
            ReaderState::Done => Ok(None),
        }
    }
}

// ============================================================================
// Export
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    Fresh,
    Vertices { first: bool },
    Edges { first: bool },
}

/// GraphSON export sink writing `EXTENDED` mode.
///
/// Vertices must all be written before the first edge.
pub struct GraphSonExportSink<W: Write> {
    writer: W,
    mode: WriteMode,
    state: SinkState,
}

impl<W: Write> GraphSonExportSink<W> {
    /// Creates a new GraphSON export sink.
    #[must_use]
    pub const fn new(writer: W, mode: WriteMode) -> Self {
        Self {
            writer,
            mode,
            state: SinkState::Fresh,
        }
    }

    fn raw(&mut self, text: &str) -> Result<()> {
        self.writer
            .write_all(text.as_bytes())
            .map_err(|e| Error::Write(e.to_string()))
    }

    fn pretty(&self) -> bool {
        self.mode == WriteMode::Pretty
    }

    fn open_array(&mut self, name: &str) -> Result<()> {
        let text = if self.pretty() {
            format!(",\n  \"{name}\": [")
        } else {
            format!(",\"{name}\":[")
        };
        self.raw(&text)
    }

    fn close_array(&mut self, empty: bool) -> Result<()> {
        if self.pretty() && !empty {
            self.raw("\n  ]")
        } else {
            self.raw("]")
        }
    }

    fn element(&mut self, first: bool, object: &Map<String, Value>) -> Result<()> {
        if !first {
            self.raw(",")?;
        }
        if self.pretty() {
            self.raw("\n    ")?;
        }
        serde_json::to_writer(&mut self.writer, object).map_err(|e| Error::Write(e.to_string()))
    }

    fn switch_to_edges(&mut self) -> Result<()> {
        if let SinkState::Vertices { first } = self.state {
            self.close_array(first)?;
            self.open_array("edges")?;
            self.state = SinkState::Edges { first: true };
        }
        Ok(())
    }
}

fn typed_json(value: &AttributeValue) -> Value {
    let inner = match value {
        AttributeValue::List(items) => Value::Array(items.iter().map(typed_json).collect()),
        other => other.to_json(),
    };
    let mut object = Map::new();
    object.insert("type".to_string(), Value::from(value.attribute_type().as_str()));
    object.insert("value".to_string(), inner);
    Value::Object(object)
}

fn attributes_json(kind: ElementKind, attributes: &Attributes, object: &mut Map<String, Value>) -> Result<()> {
    for (key, value) in attributes {
        if is_reserved(key) {
            return Err(Error::Write(format!(
                "{kind} attribute '{key}' collides with a reserved GraphSON key"
            )));
        }
        object.insert(key.clone(), typed_json(value));
    }
    Ok(())
}

impl<W: Write> ExportSink for GraphSonExportSink<W> {
    fn begin(&mut self, _types: &AttributeTypeTable) -> Result<()> {
        if self.state != SinkState::Fresh {
            return Err(Error::Write("begin called twice".to_string()));
        }
        let mode = GraphSonMode::Extended.as_str();
        let header = if self.pretty() {
            format!("{{\n  \"mode\": \"{mode}\",\n  \"vertices\": [")
        } else {
            format!("{{\"mode\":\"{mode}\",\"vertices\":[")
        };
        self.raw(&header)?;
        self.state = SinkState::Vertices { first: true };
        Ok(())
    }

    fn write_vertex(&mut self, vertex: &VertexRecord) -> Result<()> {
        let first = match self.state {
            SinkState::Vertices { first } => first,
            SinkState::Fresh => return Err(Error::Write("vertex written before begin".to_string())),
            SinkState::Edges { .. } => {
                return Err(Error::Write(
                    "GraphSON vertices must be written before edges".to_string(),
                ));
            },
        };

        let mut object = Map::new();
        object.insert(ID.to_string(), Value::from(vertex.id.as_str()));
        object.insert(TYPE.to_string(), Value::from("vertex"));
        if let Some(label) = &vertex.label {
            object.insert(LABEL.to_string(), Value::from(label.as_str()));
        }
        attributes_json(ElementKind::Vertex, &vertex.attributes, &mut object)?;

        self.element(first, &object)?;
        self.state = SinkState::Vertices { first: false };
        Ok(())
    }

    fn write_edge(&mut self, edge: &EdgeRecord) -> Result<()> {
        if self.state == SinkState::Fresh {
            return Err(Error::Write("edge written before begin".to_string()));
        }
        self.switch_to_edges()?;
        let SinkState::Edges { first } = self.state else {
            return Err(Error::Write("edge written out of order".to_string()));
        };

        let mut object = Map::new();
        object.insert(ID.to_string(), Value::from(edge.id.as_str()));
        object.insert(TYPE.to_string(), Value::from("edge"));
        object.insert(OUT_V.to_string(), Value::from(edge.source.as_str()));
        object.insert(IN_V.to_string(), Value::from(edge.target.as_str()));
        object.insert(LABEL.to_string(), Value::from(edge.label.as_str()));
        attributes_json(ElementKind::Edge, &edge.attributes, &mut object)?;

        self.element(first, &object)?;
        self.state = SinkState::Edges { first: false };
        Ok(())
    }

    fn finalize(mut self: Box<Self>) -> Result<()> {
        if self.state == SinkState::Fresh {
            self.begin(&AttributeTypeTable::new())?;
        }
        self.switch_to_edges()?;
        if let SinkState::Edges { first } = self.state {
            self.close_array(first)?;
        }
        let tail = if self.pretty() { "\n}\n" } else { "}" };
        self.raw(tail)?;
        self.writer.flush().map_err(|e| Error::Write(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::strategy::{AttributeStrategy, AttributeStrategyRegistry};
    use crate::models::GraphDocumentModel;

    const NORMAL: &str = r#"{
  "mode": "NORMAL",
  "vertices": [
    {"name": "marko", "age": 29, "_id": 1, "_type": "vertex", "__type__": "Person"},
    {"name": "lop", "lang": "java", "_id": "3", "_type": "vertex", "nothing": null}
  ],
  "edges": [
    {"weight": 0.4, "friend": true, "_id": 9, "_type": "edge", "_outV": 1, "_inV": "3", "_label": "created"}
  ]
}"#;

    fn read_all(input: &str, options: ReadOptions) -> Result<GraphDocumentModel> {
        let mut source = GraphSonImportSource::new(input.as_bytes(), options);
        GraphDocumentModel::from_source(&mut source)
    }

    #[test]
    fn test_import_normal_mode() {
        let model = read_all(NORMAL, ReadOptions::default()).unwrap();
        assert!(model.types.is_empty());
        assert_eq!(model.vertices.len(), 2);

        let marko = &model.vertices[0];
        assert_eq!(marko.id, "1");
        assert_eq!(marko.attributes.get("age"), Some(&AttributeValue::Integer(29)));
        assert!(marko.label.is_none());

        let lop = &model.vertices[1];
        assert!(!lop.attributes.contains_key("nothing"));

        let edge = &model.edges[0];
        assert_eq!(edge.id, "9");
        assert_eq!((edge.source.as_str(), edge.target.as_str()), ("1", "3"));
        assert_eq!(edge.label, "created");
        assert_eq!(edge.attributes.get("weight"), Some(&AttributeValue::Float(0.4)));
        assert_eq!(edge.attributes.get("friend"), Some(&AttributeValue::Boolean(true)));
    }

    #[test]
    fn test_import_applies_strategies_and_label_key() {
        let strategies = AttributeStrategyRegistry::new()
            .with_vertex_strategy("__type__", AttributeStrategy::Ignore)
            .with_edge_strategy("friend", AttributeStrategy::rename("knows_well"));
        let options = ReadOptions::with_strategies(strategies).with_vertex_label_key("__type__");
        let model = read_all(NORMAL, options).unwrap();

        let marko = &model.vertices[0];
        assert!(!marko.attributes.contains_key("__type__"));
        assert_eq!(marko.label.as_deref(), Some("Person"));
        assert!(model.vertices[1].label.is_none());

        let edge = &model.edges[0];
        assert!(!edge.attributes.contains_key("friend"));
        assert_eq!(
            edge.attributes.get("knows_well"),
            Some(&AttributeValue::Boolean(true))
        );
    }

    #[test]
    fn test_import_extended_mode() {
        let input = r#"{"mode":"EXTENDED","vertices":[
            {"_id":"1","_type":"vertex","age":{"type":"long","value":29},"w":{"type":"double","value":2},
             "tags":{"type":"list","value":[{"type":"string","value":"a"},{"type":"integer","value":1}]}}
        ],"edges":[]}"#;
        let model = read_all(input, ReadOptions::default()).unwrap();
        let vertex = &model.vertices[0];
        assert_eq!(vertex.attributes.get("age"), Some(&AttributeValue::Integer(29)));
        assert_eq!(vertex.attributes.get("w"), Some(&AttributeValue::Float(2.0)));
        assert_eq!(
            vertex.attributes.get("tags"),
            Some(&AttributeValue::List(vec!["a".into(), 1_i64.into()]))
        );
    }

    #[test]
    fn test_import_skips_unknown_members() {
        let input = r#"{"graph":{"nested":[1,2,{"x":"}"}]},"vertices":[{"_id":"a"}]}"#;
        let model = read_all(input, ReadOptions::default()).unwrap();
        assert_eq!(model.vertices.len(), 1);
        assert!(model.edges.is_empty());
    }

    #[test]
    fn test_import_missing_identifiers() {
        let missing_id = r#"{"vertices":[{"name":"x"}]}"#;
        assert!(matches!(
            read_all(missing_id, ReadOptions::default()),
            Err(Error::Parse { .. })
        ));

        let missing_in = r#"{"vertices":[],"edges":[{"_id":"e","_outV":"a"}]}"#;
        assert!(matches!(
            read_all(missing_in, ReadOptions::default()),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_import_rejects_object_values_in_normal_mode() {
        let input = r#"{"vertices":[{"_id":"a","props":{"k":1}}]}"#;
        assert!(read_all(input, ReadOptions::default()).is_err());
    }

    #[test]
    fn test_import_truncated_document() {
        let input = r#"{"vertices":[{"_id":"a"},{"_id":"b""#;
        let mut source = GraphSonImportSource::new(input.as_bytes(), ReadOptions::default());
        assert!(matches!(
            source.next_event().unwrap(),
            Some(ImportEvent::MetadataParsed(_))
        ));
        assert!(matches!(
            source.next_event().unwrap(),
            Some(ImportEvent::VertexParsed(_))
        ));
        assert!(matches!(source.next_event(), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_import_rejects_non_object_document() {
        assert!(read_all("[1,2]", ReadOptions::default()).is_err());
        assert!(read_all("", ReadOptions::default()).is_err());
    }

    fn sample_model() -> GraphDocumentModel {
        GraphDocumentModel::new()
            .with_vertex(
                VertexRecord::new("1")
                    .with_label("Person")
                    .with_attribute("name", "marko")
                    .with_attribute("age", 29_i64)
                    .with_attribute("score", 1.0)
                    .with_attribute("tags", AttributeValue::List(vec!["a".into(), 2_i64.into()])),
            )
            .with_vertex(VertexRecord::new("2").with_attribute("name", "  padded  "))
            .with_edge(
                EdgeRecord::new("7", "1", "2", "knows")
                    .with_attribute("weight", 0.5)
                    .with_attribute("friend", false),
            )
    }

    fn write_model(model: &GraphDocumentModel, mode: WriteMode) -> String {
        let mut out = Vec::new();
        {
            let mut sink = GraphSonExportSink::new(&mut out, mode);
            sink.write_model(model).unwrap();
            Box::new(sink).finalize().unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_export_roundtrip_preserves_types() {
        let model = sample_model();
        for mode in [WriteMode::Compact, WriteMode::Pretty] {
            let json = write_model(&model, mode);
            let parsed: Value = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed["mode"], "EXTENDED");

            let back = read_all(&json, ReadOptions::default()).unwrap();
            assert!(back.same_graph(&model), "mode {mode:?}:\n{json}");
            assert_eq!(
                back.vertices[0].attributes.get("score"),
                Some(&AttributeValue::Float(1.0))
            );
        }
    }

    #[test]
    fn test_export_pretty_puts_elements_on_lines() {
        let json = write_model(&sample_model(), WriteMode::Pretty);
        let lines: Vec<&str> = json.lines().collect();
        assert!(lines.iter().any(|l| l.starts_with("    {\"_id\":\"1\"")));
        assert!(lines.iter().any(|l| l.starts_with("    {\"_id\":\"7\"")));

        let compact = write_model(&sample_model(), WriteMode::Compact);
        assert!(!compact.contains('\n'));
    }

    #[test]
    fn test_export_empty_document() {
        let out = {
            let mut out = Vec::new();
            Box::new(GraphSonExportSink::new(&mut out, WriteMode::Compact))
                .finalize()
                .unwrap();
            out
        };
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, r#"{"mode":"EXTENDED","vertices":[],"edges":[]}"#);
    }

    #[test]
    fn test_export_rejects_vertex_after_edge() {
        let mut out = Vec::new();
        let mut sink = GraphSonExportSink::new(&mut out, WriteMode::Compact);
        sink.begin(&AttributeTypeTable::new()).unwrap();
        sink.write_vertex(&VertexRecord::new("1")).unwrap();
        sink.write_edge(&EdgeRecord::new("e", "1", "1", "loop")).unwrap();
        assert!(matches!(
            sink.write_vertex(&VertexRecord::new("2")),
            Err(Error::Write(_))
        ));
    }

    #[test]
    fn test_export_rejects_reserved_attribute() {
        let mut out = Vec::new();
        let mut sink = GraphSonExportSink::new(&mut out, WriteMode::Compact);
        sink.begin(&AttributeTypeTable::new()).unwrap();
        let vertex = VertexRecord::new("1").with_attribute("_label", "x");
        assert!(sink.write_vertex(&vertex).is_err());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("extended".parse::<GraphSonMode>().unwrap(), GraphSonMode::Extended);
        assert_eq!(GraphSonMode::default(), GraphSonMode::Normal);
        assert!("FANCY".parse::<GraphSonMode>().is_err());
    }
}
