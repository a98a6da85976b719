use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use xml::common::XmlVersion;
use xml::writer::{EmitterConfig, EventWriter, XmlEvent};

use crate::domain::{Element, RecordTree};
use crate::error::Result;

/// Serialise a tree as indented XML, creating parent folders as needed
pub fn write_file(tree: &RecordTree, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = BufWriter::new(File::create(path)?);
    write_to(tree, file)
}

pub fn write_to<W: Write>(tree: &RecordTree, sink: W) -> Result<()> {
    let mut writer = EmitterConfig::new().perform_indent(true).create_writer(sink);
    writer.write(XmlEvent::StartDocument {
        version: XmlVersion::Version10,
        encoding: Some("UTF-8"),
        standalone: None,
    })?;
    write_element(&mut writer, &tree.root, None)?;
    writer.into_inner().flush()?;
    Ok(())
}

fn write_element<W: Write>(
    writer: &mut EventWriter<W>,
    element: &Element,
    inherited_ns: Option<&str>,
) -> Result<()> {
    let mut start = XmlEvent::start_element(element.name.as_str());
    // Namespaces were stripped on parse; re-declare them as default namespaces
    if let Some(ns) = element.namespace.as_deref() {
        if inherited_ns != Some(ns) {
            start = start.default_ns(ns);
        }
    }
    for (name, value) in &element.attributes {
        start = start.attr(name.as_str(), value.as_str());
    }
    writer.write(start)?;

    if let Some(text) = element.text.as_deref() {
        writer.write(XmlEvent::characters(text))?;
    }
    for child in &element.children {
        write_element(writer, child, element.namespace.as_deref().or(inherited_ns))?;
    }

    writer.write(XmlEvent::end_element())?;
    Ok(())
}
