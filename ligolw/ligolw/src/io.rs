//! Reading and writing documents as XML text, optionally gzip compressed.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use xml::{
    EmitterConfig, ParserConfig,
    reader::XmlEvent as ReadEvent,
    writer::{EventWriter, XmlEvent as WriteEvent},
};

use crate::{Element, ElementError, ElementKind, Error, Result};

/// The XML declaration and document type written before every document.
pub const HEADER: &str = "<?xml version='1.0' encoding='utf-8' ?>\n\
<!DOCTYPE LIGO_LW SYSTEM \"http://ldas-sw.ligo.caltech.edu/doc/ligolwAPI/html/ligolw_dtd.txt\">\n";

/// Indentation for one nesting level.
pub const INDENT: &str = "\t";

fn is_gz(path: &Path) -> bool {
    path.extension().and_then(|x| x.to_str()) == Some("gz")
}

fn io_path_err(source: std::io::Error, path: &Path) -> Error {
    Error::IoPath {
        source,
        path: path.display().to_string(),
    }
}

/// Parse a document from `rdr`.
pub fn load_reader<R: Read>(rdr: R) -> Result<Element> {
    let parser = ParserConfig::new()
        .trim_whitespace(false)
        .whitespace_to_characters(true)
        .cdata_to_characters(true)
        .ignore_comments(true)
        .create_reader(rdr);

    let mut stack = vec![Element::new(ElementKind::Document)];
    for event in parser {
        match event? {
            ReadEvent::StartElement {
                name, attributes, ..
            } => {
                let kind = ElementKind::from_tag_name(&name.local_name)
                    .ok_or_else(|| ElementError::UnknownTag(name.local_name.clone()))?;
                let el = Element::with_attributes(
                    kind,
                    attributes.into_iter().map(|a| (a.name.local_name, a.value)),
                )?;
                stack.push(el);
            }
            ReadEvent::EndElement { .. } => {
                // The parser guarantees balanced tags, so the document stays
                // at the bottom of the stack.
                if stack.len() < 2 {
                    return Err(Error::Stream("unbalanced end tag".into()));
                }
                if let Some(child) = stack.pop() {
                    if let Some(parent) = stack.last_mut() {
                        parent.append_child(child)?;
                    }
                }
            }
            ReadEvent::Characters(text) => {
                if let Some(current) = stack.last_mut() {
                    if current.kind().keeps_text() {
                        current.append_data(&text);
                    }
                }
            }
            _ => {}
        }
    }
    match stack.pop() {
        Some(doc) if stack.is_empty() => Ok(doc),
        _ => Err(Error::Stream("unterminated document".into())),
    }
}

/// Load a document from a file, or from stdin when `path` is `None`.
///
/// Files whose name ends in `.gz` are decompressed.
pub fn load_filename<P: AsRef<Path>>(path: Option<P>) -> Result<Element> {
    let Some(path) = path else {
        tracing::debug!("reading document from stdin");
        return load_reader(BufReader::new(std::io::stdin().lock()));
    };
    let path = path.as_ref();
    tracing::debug!("reading {}", path.display());
    let fd = BufReader::new(File::open(path).map_err(|e| io_path_err(e, path))?);
    if is_gz(path) {
        let decoder = libflate::gzip::Decoder::new(fd).map_err(|e| io_path_err(e, path))?;
        load_reader(BufReader::new(decoder))
    } else {
        load_reader(fd)
    }
}

fn write_element<W: Write>(w: &mut EventWriter<W>, el: &Element) -> Result<()> {
    if el.kind() == ElementKind::Document {
        for child in el.children() {
            write_element(w, child)?;
        }
        return Ok(());
    }
    let mut start = WriteEvent::start_element(el.tag_name());
    for (k, v) in el.attributes() {
        start = start.attr(k.as_str(), v.as_str());
    }
    w.write(start)?;
    if let Some(text) = el.pcdata() {
        w.write(WriteEvent::characters(text))?;
    }
    for child in el.children() {
        write_element(w, child)?;
    }
    w.write(WriteEvent::end_element())?;
    Ok(())
}

/// Write `doc` as XML text, header included.
pub fn write<W: Write>(doc: &Element, mut wtr: W) -> Result<()> {
    wtr.write_all(HEADER.as_bytes())?;
    let mut w = EmitterConfig::new()
        .perform_indent(true)
        .indent_string(INDENT)
        .write_document_declaration(false)
        .create_writer(&mut wtr);
    write_element(&mut w, doc)?;
    drop(w);
    wtr.write_all(b"\n")?;
    wtr.flush()?;
    Ok(())
}

/// Write a document to a file, or to stdout when `path` is `None`.
///
/// Files whose name ends in `.gz` are compressed.
pub fn write_filename<P: AsRef<Path>>(doc: &Element, path: Option<P>) -> Result<()> {
    let Some(path) = path else {
        return write(doc, std::io::stdout().lock());
    };
    let path = path.as_ref();
    tracing::debug!("writing {}", path.display());
    let fd = BufWriter::new(File::create(path).map_err(|e| io_path_err(e, path))?);
    if is_gz(path) {
        let mut encoder = libflate::gzip::Encoder::new(fd).map_err(|e| io_path_err(e, path))?;
        write(doc, &mut encoder)?;
        let mut fd = encoder
            .finish()
            .into_result()
            .map_err(|e| io_path_err(e, path))?;
        fd.flush()?;
        Ok(())
    } else {
        write(doc, fd)
    }
}
