//! Query data-quality segments and their definitions.
//!
//! Segments live either in a remote segment database reached through the
//! ldbd protocol, or in a tree of LIGO_LW files written by the DMT, which are
//! loaded into a temporary SQLite database. Both are hidden behind
//! [QueryEngine]. The query modes in [modes] turn query results into
//! `segment_definer`, `segment_summary` and `segment` tables.

mod engine;
mod files;
mod ldbd;
mod local;
pub mod modes;
mod process;
mod resolve;
mod spec;

pub use engine::{QueryEngine, Row, SegmentSource, connect};
pub use files::{DEFAULT_PAD, files_in_range};
pub use ldbd::{DEFAULT_PORT, LdbdEngine};
pub use local::LocalEngine;
pub use process::{register_process, set_process_end_time};
pub use resolve::{VersionSegments, build_segment_list, resolve_versions};
pub use spec::{SegmentSpec, parse_spec_list};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("IO error with \"{path}\": {source}")]
    IoPath {
        source: std::io::Error,
        path: String,
    },
    #[error("{0}")]
    Ligolw(#[from] ligolw::Error),
    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("unsupported segment source \"{0}\"")]
    UnsupportedSource(String),
    #[error("cannot connect to {target}: {source}")]
    Connection {
        target: String,
        source: std::io::Error,
    },
    #[error("invalid segment specifier \"{spec}\": {msg}")]
    BadSpec { spec: String, msg: String },
    #[error("server returned error code {code}: {msg}")]
    Server { code: i64, msg: String },
    #[error("malformed server reply: {0}")]
    Protocol(String),
    #[error("unexpected value in column {column}: {value:?}")]
    UnexpectedValue {
        column: &'static str,
        value: ligolw::Value,
    },
}

impl Error {
    /// True for failures to reach the segment source at all.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
