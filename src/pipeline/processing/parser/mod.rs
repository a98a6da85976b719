use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use xml::reader::{ParserConfig, XmlEvent};

use crate::domain::{Element, RecordTree};
use crate::error::{CinError, Result};

pub mod writer;

pub use writer::{write_file, write_to};

/// Turns raw bytes into a record tree
pub trait RecordParser {
    fn parse(&self, name: &str, bytes: &[u8]) -> Result<RecordTree>;
}

/// CIN Census XML parser; namespaces are stripped once here so every later
/// stage works on local names only
#[derive(Debug, Default, Clone, Copy)]
pub struct CinXmlParser;

impl RecordParser for CinXmlParser {
    fn parse(&self, name: &str, bytes: &[u8]) -> Result<RecordTree> {
        parse_reader(name, bytes)
    }
}

/// Element still waiting for its end tag
struct OpenElement {
    element: Element,
    text: Option<String>,
}

pub fn parse_file(path: &Path) -> Result<RecordTree> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let file = File::open(path)?;
    parse_reader(&name, BufReader::new(file))
}

pub fn parse_str(name: &str, xml: &str) -> Result<RecordTree> {
    parse_reader(name, xml.as_bytes())
}

pub fn parse_reader<R: Read>(name: &str, source: R) -> Result<RecordTree> {
    let reader = ParserConfig::new()
        .cdata_to_characters(true)
        .ignore_comments(true)
        .create_reader(source);

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<Element> = None;
    let mut elements = 0usize;

    for event in reader {
        match event? {
            XmlEvent::StartElement { name, attributes, .. } => {
                let mut element = Element::new(name.local_name);
                element.namespace = name.namespace;
                element.attributes = attributes
                    .into_iter()
                    .map(|attr| (attr.name.local_name, attr.value))
                    .collect();
                stack.push(OpenElement { element, text: None });
                elements += 1;
            }
            XmlEvent::Characters(text) | XmlEvent::Whitespace(text) => {
                if let Some(open) = stack.last_mut() {
                    open.text.get_or_insert_with(String::new).push_str(&text);
                }
            }
            XmlEvent::EndElement { .. } => {
                if let Some(OpenElement { mut element, text }) = stack.pop() {
                    // Only leaves carry values; whitespace between children is layout
                    if element.is_leaf() {
                        element.text = text;
                    }
                    match stack.last_mut() {
                        Some(parent) => parent.element.children.push(element),
                        None => root = Some(element),
                    }
                }
            }
            _ => {}
        }
    }

    debug!("parsed {} elements from {}", elements, name);

    root.map(|root| RecordTree::new(name, root))
        .ok_or_else(|| CinError::NoRootElement(PathBuf::from(name)))
}
