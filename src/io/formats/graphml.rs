//! GraphML format adapter for import/export.
//!
//! Layout read and written:
//!
//! ```xml
//! <graphml xmlns="http://graphml.graphdrawing.org/xmlns">
//!   <key id="name" for="node" attr.name="name" attr.type="string"/>
//!   <key id="weight" for="edge" attr.name="weight" attr.type="double"/>
//!   <graph id="G" edgedefault="directed">
//!     <node id="1" label="Person"><data key="name">marko</data></node>
//!     <edge id="7" source="1" target="2" label="knows"><data key="weight">0.5</data></edge>
//!   </graph>
//! </graphml>
//! ```
//!
//! GraphML has no list type. List keys are declared as `attr.type="string"`
//! with an extra `graphport.type="list"` marker and carry JSON array text;
//! other readers see the raw text.

use super::ReadOptions;
use super::WriteMode;
use crate::io::traits::{ExportSink, ImportEvent, ImportSource};
use crate::models::{
    AttributeDeclaration, AttributeType, AttributeTypeTable, AttributeValue, DEFAULT_EDGE_LABEL,
    EdgeRecord, ElementKind, VertexRecord,
};
use crate::{Error, Result};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::collections::{HashMap, HashSet};
use std::io::{BufRead, Write};

/// GraphML XML namespace.
pub const GRAPHML_NAMESPACE: &str = "http://graphml.graphdrawing.org/xmlns";

/// Key attribute marking a list-valued key.
const LIST_MARKER_ATTR: &str = "graphport.type";

// ============================================================================
// XML plumbing
// ============================================================================

/// Owned view of one XML event; only the parts the adapter needs.
#[derive(Debug)]
enum XmlItem {
    Start(String, Vec<(String, String)>),
    Empty(String, Vec<(String, String)>),
    End(String),
    Text(String),
    Eof,
    Other,
}

/// Pull cursor over a quick-xml reader that hands out owned items.
struct XmlCursor<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl<R: BufRead> XmlCursor<R> {
    fn new(reader: R) -> Self {
        Self {
            reader: Reader::from_reader(reader),
            buf: Vec::new(),
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::parse_at(offset(&self.reader), message)
    }

    fn next_item(&mut self) -> Result<XmlItem> {
        self.buf.clear();
        let event = self.reader.read_event_into(&mut self.buf);
        let item = match event {
            Ok(Event::Start(start)) => {
                let (name, attrs) = owned_start(&start)?;
                XmlItem::Start(name, attrs)
            },
            Ok(Event::Empty(start)) => {
                let (name, attrs) = owned_start(&start)?;
                XmlItem::Empty(name, attrs)
            },
            Ok(Event::End(end)) => {
                XmlItem::End(String::from_utf8_lossy(end.local_name().as_ref()).into_owned())
            },
            Ok(Event::Text(text)) => XmlItem::Text(
                text.unescape()
                    .map_err(|e| Error::parse(format!("invalid text content: {e}")))?
                    .into_owned(),
            ),
            Ok(Event::CData(data)) => XmlItem::Text(String::from_utf8_lossy(&data).into_owned()),
            Ok(Event::Eof) => XmlItem::Eof,
            Ok(_) => XmlItem::Other,
            Err(quick_xml::Error::Io(io)) => return Err(Error::Read(io.to_string())),
            Err(e) => return Err(Error::parse_at(offset(&self.reader), e.to_string())),
        };
        Ok(item)
    }

    /// Skips the remainder of an element whose start tag was just read.
    fn skip_element(&mut self) -> Result<()> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.next_item()? {
                XmlItem::Start(..) => depth += 1,
                XmlItem::End(_) => depth -= 1,
                XmlItem::Eof => return Err(self.error("unexpected end of document")),
                _ => {},
            }
        }
        Ok(())
    }

    /// Reads text content up to the end tag of the current element.
    fn read_text(&mut self, element: &str) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.next_item()? {
                XmlItem::Text(t) => text.push_str(&t),
                XmlItem::End(_) => return Ok(text),
                XmlItem::Start(name, _) | XmlItem::Empty(name, _) => {
                    return Err(self.error(format!("unexpected <{name}> inside <{element}>")));
                },
                XmlItem::Eof => return Err(self.error("unexpected end of document")),
                XmlItem::Other => {},
            }
        }
    }
}

fn offset<R>(reader: &Reader<R>) -> u64 {
    u64::try_from(reader.buffer_position()).unwrap_or(u64::MAX)
}

fn owned_start(start: &BytesStart<'_>) -> Result<(String, Vec<(String, String)>)> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::parse(format!("invalid attribute on <{name}>: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::parse(format!("invalid attribute value on <{name}>: {e}")))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok((name, attrs))
}

fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

// ============================================================================
// Import
// ============================================================================

/// Element scope of a `<key>` declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyDomain {
    Node,
    Edge,
    All,
    Graph,
}

impl KeyDomain {
    fn parse(s: Option<&str>) -> Self {
        match s.map(str::to_lowercase).as_deref() {
            Some("node") => Self::Node,
            Some("edge") => Self::Edge,
            Some("graph") => Self::Graph,
            _ => Self::All,
        }
    }

    const fn applies_to(self, kind: ElementKind) -> bool {
        matches!(
            (self, kind),
            (Self::All, _) | (Self::Node, ElementKind::Vertex) | (Self::Edge, ElementKind::Edge)
        )
    }
}

/// A `<key>` as declared in the document.
#[derive(Debug, Clone)]
struct KeyBinding {
    domain: KeyDomain,
    declaration: AttributeDeclaration,
    /// Keys carrying tool-specific markup (e.g. yFiles graphics) are skipped.
    ignored: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    Prolog,
    InGraph,
    Done,
}

/// GraphML import source.
///
/// Reads `<key>` declarations, emits them as one
/// [`ImportEvent::MetadataParsed`], then yields one event per `<node>` or
/// `<edge>` while streaming through the `<graph>` element.
pub struct GraphMlImportSource<R: BufRead> {
    cursor: XmlCursor<R>,
    options: ReadOptions,
    keys: HashMap<String, KeyBinding>,
    types: AttributeTypeTable,
    state: ReaderState,
    saw_root: bool,
    edge_ordinal: usize,
}

impl<R: BufRead> GraphMlImportSource<R> {
    /// Creates a new GraphML import source.
    #[must_use]
    pub fn new(reader: R, options: ReadOptions) -> Self {
        Self {
            cursor: XmlCursor::new(reader),
            options,
            keys: HashMap::new(),
            types: AttributeTypeTable::new(),
            state: ReaderState::Prolog,
            saw_root: false,
            edge_ordinal: 0,
        }
    }

    fn read_key(&mut self, attrs: &[(String, String)], has_body: bool) -> Result<()> {
        let id = attr(attrs, "id")
            .ok_or_else(|| self.cursor.error("<key> without id"))?
            .to_string();
        let domain = KeyDomain::parse(attr(attrs, "for"));
        let name = attr(attrs, "attr.name").unwrap_or(&id).to_string();
        let ignored = attr(attrs, "yfiles.type").is_some();

        let ty = if attr(attrs, LIST_MARKER_ATTR) == Some("list") {
            AttributeType::List
        } else {
            match attr(attrs, "attr.type") {
                Some(t) if !ignored => t.parse::<AttributeType>().map_err(|_| {
                    self.cursor
                        .error(format!("unsupported attr.type '{t}' on key '{id}'"))
                })?,
                _ => AttributeType::String,
            }
        };

        let mut declaration = AttributeDeclaration::new(name, ty);
        if has_body {
            declaration.default = self.read_key_body(&id, ty, ignored)?;
        }

        if !ignored {
            for kind in [ElementKind::Vertex, ElementKind::Edge] {
                if domain.applies_to(kind) {
                    self.types.declare(kind, declaration.clone());
                }
            }
        }

        tracing::trace!(key = %id, name = %declaration.name, ty = %ty, "GraphML key declared");
        self.keys.insert(
            id,
            KeyBinding {
                domain,
                declaration,
                ignored,
            },
        );
        Ok(())
    }

    /// Reads `<default>` (and skips `<desc>`) inside a `<key>` element.
    fn read_key_body(
        &mut self,
        id: &str,
        ty: AttributeType,
        ignored: bool,
    ) -> Result<Option<AttributeValue>> {
        let mut default = None;
        loop {
            match self.cursor.next_item()? {
                XmlItem::Start(name, _) if name == "default" && !ignored => {
                    let text = self.cursor.read_text("default")?;
                    default = Some(ty.coerce(&text).map_err(|e| {
                        self.cursor
                            .error(format!("invalid default for key '{id}': {e}"))
                    })?);
                },
                XmlItem::Start(..) => self.cursor.skip_element()?,
                XmlItem::End(_) => return Ok(default),
                XmlItem::Eof => return Err(self.cursor.error("unexpected end of document")),
                _ => {},
            }
        }
    }

    /// Reads `<data>` children up to the element's end tag.
    fn read_data(&mut self, kind: ElementKind, element: &str) -> Result<Vec<(String, AttributeValue)>> {
        let mut raw = Vec::new();
        loop {
            match self.cursor.next_item()? {
                XmlItem::Start(name, attrs) if name == "data" => {
                    let binding = self.binding_for(kind, &attrs)?;
                    if binding.ignored {
                        self.cursor.skip_element()?;
                        continue;
                    }
                    let text = self.cursor.read_text("data")?;
                    raw.push(self.coerce(&binding, &text)?);
                },
                XmlItem::Empty(name, attrs) if name == "data" => {
                    let binding = self.binding_for(kind, &attrs)?;
                    if !binding.ignored {
                        raw.push((
                            binding.declaration.name.clone(),
                            binding.declaration.empty_value(),
                        ));
                    }
                },
                XmlItem::Start(name, _) | XmlItem::Empty(name, _) if name == "graph" => {
                    return Err(self.cursor.error("nested graphs are not supported"));
                },
                XmlItem::Start(..) => self.cursor.skip_element()?,
                XmlItem::End(_) => return Ok(raw),
                XmlItem::Eof => {
                    return Err(self
                        .cursor
                        .error(format!("unexpected end of document inside <{element}>")));
                },
                _ => {},
            }
        }
    }

    fn binding_for(&self, kind: ElementKind, attrs: &[(String, String)]) -> Result<KeyBinding> {
        let key = attr(attrs, "key").ok_or_else(|| self.cursor.error("<data> without key"))?;
        match self.keys.get(key) {
            Some(binding) if binding.domain.applies_to(kind) => Ok(binding.clone()),
            Some(_) => Err(self
                .cursor
                .error(format!("key '{key}' is not declared for {kind} elements"))),
            None => Err(self.cursor.error(format!("undeclared key '{key}'"))),
        }
    }

    fn coerce(&self, binding: &KeyBinding, text: &str) -> Result<(String, AttributeValue)> {
        let declaration = &binding.declaration;
        let blank = match declaration.ty {
            AttributeType::String => text.is_empty(),
            _ => text.trim().is_empty(),
        };
        let value = if blank {
            declaration.empty_value()
        } else {
            declaration.ty.coerce(text).map_err(|e| {
                self.cursor
                    .error(format!("attribute '{}': {e}", declaration.name))
            })?
        };
        Ok((declaration.name.clone(), value))
    }

    fn read_node(&mut self, attrs: &[(String, String)], has_body: bool) -> Result<VertexRecord> {
        let id = attr(attrs, "id")
            .ok_or_else(|| self.cursor.error("<node> without id"))?
            .to_string();
        let raw = if has_body {
            self.read_data(ElementKind::Vertex, "node")?
        } else {
            Vec::new()
        };

        let mut label = attr(attrs, "label").map(str::to_string);
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

    fn read_edge(&mut self, attrs: &[(String, String)], has_body: bool) -> Result<EdgeRecord> {
        let ordinal = self.edge_ordinal;
        self.edge_ordinal += 1;

        let id = attr(attrs, "id").map_or_else(|| format!("e{ordinal}"), str::to_string);
        let source = attr(attrs, "source")
            .ok_or_else(|| self.cursor.error(format!("edge '{id}' without source")))?
            .to_string();
        let target = attr(attrs, "target")
            .ok_or_else(|| self.cursor.error(format!("edge '{id}' without target")))?
            .to_string();
        let label = attr(attrs, "label").unwrap_or(DEFAULT_EDGE_LABEL).to_string();
        let raw = if has_body {
            self.read_data(ElementKind::Edge, "edge")?
        } else {
            Vec::new()
        };

        Ok(EdgeRecord {
            id,
            source,
            target,
            label,
            attributes: self.options.strategies.apply_all(ElementKind::Edge, raw),
        })
    }

    fn enter_graph(&mut self) -> ImportEvent {
        self.state = ReaderState::InGraph;
        tracing::debug!(declarations = self.types.len(), "GraphML metadata parsed");
        ImportEvent::MetadataParsed(self.types.clone())
    }

    fn next_in_prolog(&mut self) -> Result<Option<ImportEvent>> {
        loop {
            match self.cursor.next_item()? {
                XmlItem::Start(name, _) if name == "graphml" => self.saw_root = true,
                XmlItem::Start(name, attrs) if name == "key" => self.read_key(&attrs, true)?,
                XmlItem::Empty(name, attrs) if name == "key" => self.read_key(&attrs, false)?,
                XmlItem::Start(name, _) if name == "graph" => return Ok(Some(self.enter_graph())),
                XmlItem::Empty(name, _) if name == "graph" => {
                    let event = self.enter_graph();
                    self.state = ReaderState::Done;
                    return Ok(Some(event));
                },
                XmlItem::Start(name, _) if !self.saw_root => {
                    return Err(self
                        .cursor
                        .error(format!("expected <graphml> root, found <{name}>")));
                },
                XmlItem::Start(..) => self.cursor.skip_element()?,
                // A document without <graph> is an empty graph.
                XmlItem::Eof if self.saw_root => {
                    let event = self.enter_graph();
                    self.state = ReaderState::Done;
                    return Ok(Some(event));
                },
                XmlItem::Eof => return Err(self.cursor.error("not a GraphML document")),
                _ => {},
            }
        }
    }

    fn next_in_graph(&mut self) -> Result<Option<ImportEvent>> {
        loop {
            match self.cursor.next_item()? {
                XmlItem::Start(name, attrs) if name == "node" => {
                    return self.read_node(&attrs, true).map(|v| Some(ImportEvent::VertexParsed(v)));
                },
                XmlItem::Empty(name, attrs) if name == "node" => {
                    return self.read_node(&attrs, false).map(|v| Some(ImportEvent::VertexParsed(v)));
                },
                XmlItem::Start(name, attrs) if name == "edge" => {
                    return self.read_edge(&attrs, true).map(|e| Some(ImportEvent::EdgeParsed(e)));
                },
                XmlItem::Empty(name, attrs) if name == "edge" => {
                    return self.read_edge(&attrs, false).map(|e| Some(ImportEvent::EdgeParsed(e)));
                },
                XmlItem::Start(name, _) | XmlItem::Empty(name, _) if name == "key" => {
                    return Err(self
                        .cursor
                        .error("<key> declared after graph elements"));
                },
                XmlItem::Start(name, _) | XmlItem::Empty(name, _) if name == "graph" => {
                    return Err(self.cursor.error("nested graphs are not supported"));
                },
                XmlItem::Start(..) => self.cursor.skip_element()?,
                XmlItem::End(name) if name == "graph" => {
                    self.state = ReaderState::Done;
                    return Ok(None);
                },
                XmlItem::Eof => return Err(self.cursor.error("unexpected end of document")),
                _ => {},
            }
        }
    }
}

impl<R: BufRead> ImportSource for GraphMlImportSource<R> {
    fn next_event(&mut self) -> Result<Option<ImportEvent>> {
        match self.state {
            ReaderState::Prolog => self.next_in_prolog(),
            ReaderState::InGraph => self.next_in_graph(),
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
    Open,
}

/// GraphML export sink.
///
/// Declares every key of the [`AttributeTypeTable`] passed to `begin`, then
/// streams `<node>` and `<edge>` elements.
pub struct GraphMlExportSink<W: Write> {
    writer: Writer<W>,
    state: SinkState,
    types: AttributeTypeTable,
    key_ids: HashMap<(ElementKind, String), String>,
}

impl<W: Write> GraphMlExportSink<W> {
    /// Creates a new GraphML export sink.
    #[must_use]
    pub fn new(writer: W, mode: WriteMode) -> Self {
        let writer = match mode {
            WriteMode::Compact => Writer::new(writer),
            WriteMode::Pretty => Writer::new_with_indent(writer, b' ', 2),
        };
        Self {
            writer,
            state: SinkState::Fresh,
            types: AttributeTypeTable::new(),
            key_ids: HashMap::new(),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| Error::Write(e.to_string()))
    }

    fn ensure_open(&self, what: &str) -> Result<()> {
        if self.state == SinkState::Open {
            Ok(())
        } else {
            Err(Error::Write(format!("{what} written before begin")))
        }
    }

    fn write_key(&mut self, kind: ElementKind, id: &str, declaration: &AttributeDeclaration) -> Result<()> {
        let domain = match kind {
            ElementKind::Vertex => "node",
            ElementKind::Edge => "edge",
        };
        let ty = match declaration.ty {
            AttributeType::List => AttributeType::String.as_str(),
            other => other.as_str(),
        };
        let mut start = BytesStart::new("key");
        start.push_attribute(("id", id));
        start.push_attribute(("for", domain));
        start.push_attribute(("attr.name", declaration.name.as_str()));
        start.push_attribute(("attr.type", ty));
        if declaration.ty == AttributeType::List {
            start.push_attribute((LIST_MARKER_ATTR, "list"));
        }

        match &declaration.default {
            Some(default) => {
                let text = default.text_as(declaration.ty)?;
                self.event(Event::Start(start))?;
                self.writer
                    .create_element("default")
                    .write_text_content(BytesText::new(&text))
                    .map_err(|e| Error::Write(e.to_string()))?;
                self.event(Event::End(BytesEnd::new("key")))
            },
            None => self.event(Event::Empty(start)),
        }
    }

    fn write_data(&mut self, kind: ElementKind, key: &str, value: &AttributeValue) -> Result<()> {
        let declared = self
            .types
            .type_of(kind, key)
            .ok_or_else(|| Error::Write(format!("{kind} attribute '{key}' has no key declaration")))?;
        let text = value.text_as(declared)?;
        let id = self
            .key_ids
            .get(&(kind, key.to_string()))
            .cloned()
            .unwrap_or_else(|| key.to_string());
        self.writer
            .create_element("data")
            .with_attribute(("key", id.as_str()))
            .write_text_content(BytesText::new(&text))
            .map_err(|e| Error::Write(e.to_string()))?;
        Ok(())
    }
}

impl<W: Write> ExportSink for GraphMlExportSink<W> {
    fn begin(&mut self, types: &AttributeTypeTable) -> Result<()> {
        if self.state != SinkState::Fresh {
            return Err(Error::Write("begin called twice".to_string()));
        }
        self.types = types.clone();

        self.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let mut root = BytesStart::new("graphml");
        root.push_attribute(("xmlns", GRAPHML_NAMESPACE));
        self.event(Event::Start(root))?;

        // Key ids must be unique across node and edge keys.
        let mut used = HashSet::new();
        for kind in [ElementKind::Vertex, ElementKind::Edge] {
            let declarations: Vec<AttributeDeclaration> =
                types.declarations(kind).cloned().collect();
            for declaration in declarations {
                let mut id = declaration.name.clone();
                while !used.insert(id.clone()) {
                    id = format!("{}.{id}", &kind.as_str()[..1]);
                }
                self.write_key(kind, &id, &declaration)?;
                self.key_ids.insert((kind, declaration.name.clone()), id);
            }
        }

        let mut graph = BytesStart::new("graph");
        graph.push_attribute(("id", "G"));
        graph.push_attribute(("edgedefault", "directed"));
        self.event(Event::Start(graph))?;
        self.state = SinkState::Open;
        Ok(())
    }

    fn write_vertex(&mut self, vertex: &VertexRecord) -> Result<()> {
        self.ensure_open("vertex")?;
        let mut start = BytesStart::new("node");
        start.push_attribute(("id", vertex.id.as_str()));
        if let Some(label) = &vertex.label {
            start.push_attribute(("label", label.as_str()));
        }

        if vertex.attributes.is_empty() {
            return self.event(Event::Empty(start));
        }
        self.event(Event::Start(start))?;
        for (key, value) in &vertex.attributes {
            self.write_data(ElementKind::Vertex, key, value)?;
        }
        self.event(Event::End(BytesEnd::new("node")))
    }

    fn write_edge(&mut self, edge: &EdgeRecord) -> Result<()> {
        self.ensure_open("edge")?;
        let mut start = BytesStart::new("edge");
        start.push_attribute(("id", edge.id.as_str()));
        start.push_attribute(("source", edge.source.as_str()));
        start.push_attribute(("target", edge.target.as_str()));
        start.push_attribute(("label", edge.label.as_str()));

        if edge.attributes.is_empty() {
            return self.event(Event::Empty(start));
        }
        self.event(Event::Start(start))?;
        for (key, value) in &edge.attributes {
            self.write_data(ElementKind::Edge, key, value)?;
        }
        self.event(Event::End(BytesEnd::new("edge")))
    }

    fn finalize(mut self: Box<Self>) -> Result<()> {
        if self.state == SinkState::Fresh {
            self.begin(&AttributeTypeTable::new())?;
        }
        self.event(Event::End(BytesEnd::new("graph")))?;
        self.event(Event::End(BytesEnd::new("graphml")))?;
        self.writer
            .get_mut()
            .flush()
            .map_err(|e| Error::Write(e.to_string()))
    }
}
