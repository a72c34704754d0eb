//! Format adapters for import/export.
//!
//! Each format implements both [`ImportSource`] and [`ExportSink`].

pub mod graphml;
pub mod graphson;
mod json_stream;

use crate::io::strategy::AttributeStrategyRegistry;
use crate::{Error, Result};
use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use super::traits::{ExportSink, ImportSource};

/// Supported interchange formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// GraphML (XML).
    #[default]
    GraphMl,
    /// GraphSON (JSON).
    GraphSon,
}

impl Format {
    /// Returns all available formats.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::GraphMl, Self::GraphSon]
    }

    /// Returns the file extensions recognized for this format.
    ///
    /// The first entry is the one written by default.
    #[must_use]
    pub const fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::GraphMl => &["graphml", "xml"],
            Self::GraphSon => &["json", "graphson"],
        }
    }

    /// Detects format from file extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the extension is not recognized.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| {
                Error::Configuration(
                    "cannot determine format: file has no extension".to_string(),
                )
            })?;

        Self::all()
            .iter()
            .copied()
            .find(|format| format.extensions().contains(&ext.as_str()))
            .ok_or_else(|| Error::Configuration(format!("unsupported file extension: .{ext}")))
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|format| format.extensions().contains(&name.as_str()))
            .ok_or_else(|| Error::Configuration(format!("unknown format: {s}")))
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GraphMl => write!(f, "graphml"),
            Self::GraphSon => write!(f, "graphson"),
        }
    }
}

/// Output layout for writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WriteMode {
    /// No insignificant whitespace.
    Compact,
    /// Indented, one element per line.
    #[default]
    Pretty,
}

/// Reader configuration shared by both formats.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Strategies applied to every attribute.
    pub strategies: AttributeStrategyRegistry,
    /// Attribute whose raw value labels a vertex that has no explicit label.
    ///
    /// The value is read before strategies run, so renaming or dropping the
    /// attribute does not change the label.
    pub vertex_label_key: Option<String>,
}

impl ReadOptions {
    /// Creates options with the given strategies.
    #[must_use]
    pub fn with_strategies(strategies: AttributeStrategyRegistry) -> Self {
        Self {
            strategies,
            vertex_label_key: None,
        }
    }

    /// Sets the vertex label key.
    #[must_use]
    pub fn with_vertex_label_key(mut self, key: impl Into<String>) -> Self {
        self.vertex_label_key = Some(key.into());
        self
    }
}

/// Creates an import source for the given format and reader.
pub fn create_import_source<'a, R: BufRead + 'a>(
    reader: R,
    format: Format,
    options: ReadOptions,
) -> Box<dyn ImportSource + 'a> {
    match format {
        Format::GraphMl => Box::new(graphml::GraphMlImportSource::new(reader, options)),
        Format::GraphSon => Box::new(graphson::GraphSonImportSource::new(reader, options)),
    }
}

/// Creates an export sink for the given format and writer.
pub fn create_export_sink<'a, W: Write + 'a>(
    writer: W,
    format: Format,
    mode: WriteMode,
) -> Box<dyn ExportSink + 'a> {
    match format {
        Format::GraphMl => Box::new(graphml::GraphMlExportSink::new(writer, mode)),
        Format::GraphSon => Box::new(graphson::GraphSonExportSink::new(writer, mode)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!(Format::from_str("graphml").unwrap(), Format::GraphMl);
        assert_eq!(Format::from_str("GraphSON").unwrap(), Format::GraphSon);
        assert_eq!(Format::from_str("json").unwrap(), Format::GraphSon);
        assert!(Format::from_str("gexf").is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            Format::from_path(Path::new("graph-example-2.xml")).unwrap(),
            Format::GraphMl
        );
        assert_eq!(
            Format::from_path(Path::new("out.GRAPHML")).unwrap(),
            Format::GraphMl
        );
        assert_eq!(
            Format::from_path(Path::new("dump.json")).unwrap(),
            Format::GraphSon
        );
        assert!(Format::from_path(Path::new("dump.csv")).is_err());
        assert!(Format::from_path(Path::new("dump")).is_err());
    }

    #[test]
    fn test_default_extension_detects_its_format() {
        for format in Format::all() {
            let path = Path::new("graph").with_extension(format.extensions()[0]);
            assert_eq!(Format::from_path(&path).unwrap(), *format);
        }
    }

    #[test]
    fn test_format_display_parses_back() {
        for format in Format::all() {
            assert_eq!(Format::from_str(&format.to_string()).unwrap(), *format);
        }
    }
}
