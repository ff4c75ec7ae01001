//! LIGO Light Weight (LIGO_LW) XML documents.
//!
//! A document is a tree of [Element]s rooted on an element of kind
//! [ElementKind::Document]. Tables are the interesting part: their rows live
//! as delimited text in a `Stream` element, and [Table] decodes them into
//! typed [Value]s and back again.
//!
//! ```
//! use ligolw::{lsctables, Value};
//!
//! let mut table = lsctables::SEGMENT.new_table(Some(&["segment_id", "start_time", "end_time"]))?;
//! table.append_named(&[
//!     ("segment_id", Value::Ilwd(table.next_id("segment_id"))),
//!     ("start_time", Value::Int(100)),
//!     ("end_time", Value::Int(200)),
//! ])?;
//! let mut doc = ligolw::new_document();
//! ligolw::append_table(&mut doc, &table)?;
//! let mut buf = Vec::new();
//! ligolw::write(&doc, &mut buf)?;
//! let reloaded = ligolw::load_reader(&buf[..])?;
//! assert_eq!(ligolw::get_table(&reloaded, "segment")?, table);
//! # Ok::<(), ligolw::Error>(())
//! ```

mod document;
mod element;
mod io;
pub mod lsctables;
mod merge;
pub mod print_tables;
mod table;
mod tokenizer;
mod types;

pub use document::{append_table, get_table, ligo_lw, ligo_lw_mut, new_document, replace_table, tables};
pub use element::{Element, ElementError, ElementKind};
pub use io::{HEADER, INDENT, load_filename, load_reader, write, write_filename};
pub use merge::merge_documents;
pub use table::{Column, Table, strip_column_name, strip_table_name};
pub use tokenizer::{dump_rows, tokenize};
pub use types::{ColumnType, Value};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("IO error with \"{path}\": {source}")]
    IoPath {
        source: std::io::Error,
        path: String,
    },
    #[error("XML parse error: {0}")]
    XmlRead(#[from] xml::reader::Error),
    #[error("XML write error: {0}")]
    XmlWrite(#[from] xml::writer::Error),
    #[error("{0}")]
    Element(#[from] ElementError),
    #[error("malformed stream: {0}")]
    Stream(String),
    #[error("table \"{table}\": {msg}")]
    Table { table: String, msg: String },
    #[error("unknown column type \"{0}\"")]
    UnknownColumnType(String),
    #[error("cannot parse \"{token}\" as {column_type}")]
    ParseValue { token: String, column_type: String },
    #[error("table \"{0}\" not found")]
    TableNotFound(String),
    #[error("document has no LIGO_LW element")]
    NoLigoLw,
}

pub type Result<T> = std::result::Result<T, Error>;
