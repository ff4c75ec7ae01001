use std::path::PathBuf;

use segments::Segment;
use url::Url;

use crate::{DEFAULT_PAD, Error, LdbdEngine, LocalEngine, Result, files_in_range};

/// One result row, in the order of the selected columns.
pub type Row = Vec<ligolw::Value>;

/// Something that answers SQL queries over the segment tables.
pub trait QueryEngine {
    fn query(&mut self, sql: &str) -> Result<Vec<Row>>;

    /// A short human readable liveness reply.
    fn ping(&mut self) -> Result<String>;

    fn describe(&self) -> String;

    /// Whether id joins must also match `segment_def_cdb` against
    /// `creator_db`, as in the server schema.
    fn joins_on_creator_db(&self) -> bool {
        false
    }
}

/// Where segments come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentSource {
    /// An ldbd server, `ldbd://host[:port]`.
    Ldbd(Url),
    /// A DMT segment file, or a directory tree of them.
    Files(PathBuf),
}

impl SegmentSource {
    /// Interpret an `ldbd://` or `file://` URL.
    pub fn from_url(s: &str) -> Result<Self> {
        let url = Url::parse(s)?;
        match url.scheme() {
            "ldbd" => Ok(SegmentSource::Ldbd(url)),
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| Error::UnsupportedSource(s.to_string()))?;
                Ok(SegmentSource::Files(path))
            }
            _ => Err(Error::UnsupportedSource(s.to_string())),
        }
    }
}

/// Open an engine for `source`.
///
/// For files, only those that may hold data for `window` are loaded, or every
/// segment file when `window` is `None`.
pub fn connect(source: &SegmentSource, window: Option<Segment>) -> Result<Box<dyn QueryEngine>> {
    match source {
        SegmentSource::Ldbd(url) => {
            let engine = LdbdEngine::new(url)?;
            tracing::info!("using segment server {}", engine.describe());
            Ok(Box::new(engine))
        }
        SegmentSource::Files(path) => {
            let (start, end) = match window {
                Some(w) => (w.start(), w.end()),
                None => (i64::MIN, i64::MAX),
            };
            let files = files_in_range(path, start, end, DEFAULT_PAD)?;
            tracing::info!(
                "loading {} segment files from {}",
                files.len(),
                path.display()
            );
            let engine = LocalEngine::from_files(&files)?;
            Ok(Box::new(engine))
        }
    }
}
