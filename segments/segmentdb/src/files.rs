//! Finding DMT segment files for a time range.
//!
//! The DMT writes files named `<prefix>-<START>-<DURATION>.xml` into
//! directories named `<prefix>-<START / 100000>`.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::{Error, Result};

/// Seconds of slack around the requested range when matching file start
/// times.
pub const DEFAULT_PAD: i64 = 64;

struct Patterns {
    dir: Regex,
    file: Regex,
}

impl Patterns {
    fn new() -> Result<Self> {
        Ok(Self {
            dir: Regex::new(r"-(\d{4,5})$")?,
            file: Regex::new(r"^.+-(\d+)-(\d+)\.xml$")?,
        })
    }

    fn file_start(&self, name: &str) -> Option<i64> {
        self.file.captures(name)?.get(1)?.as_str().parse().ok()
    }
}

fn io_err(source: std::io::Error, path: &Path) -> Error {
    Error::IoPath {
        source,
        path: path.display().to_string(),
    }
}

fn walk(root: &Path, patterns: &Patterns, start: i64, end: i64, pad: i64) -> Result<Vec<PathBuf>> {
    let dirs = start.div_euclid(100_000)..=end.div_euclid(100_000);
    let starts = start.saturating_sub(pad)..=end.saturating_add(pad);
    let walker = walkdir::WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            // numbered directories outside the range are pruned
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            match patterns.dir.captures(&name) {
                Some(caps) => caps[1]
                    .parse::<i64>()
                    .is_ok_and(|n| dirs.contains(&n)),
                None => true,
            }
        });
    let mut out = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if patterns
            .file_start(&name)
            .is_some_and(|t| starts.contains(&t))
        {
            out.push(entry.into_path());
        }
    }
    Ok(out)
}

/// Segment files under `path` which may hold segments for `[start, end)`.
///
/// A plain file is returned as is if its name has the DMT form. The result
/// is sorted.
pub fn files_in_range<P: AsRef<Path>>(
    path: P,
    start: i64,
    end: i64,
    pad: i64,
) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    let patterns = Patterns::new()?;
    let mut out = if path.is_dir() {
        walk(path, &patterns, start, end, pad)?
    } else {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if !path.exists() {
            return Err(io_err(
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
                path,
            ));
        }
        if patterns.file.is_match(&name) {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        }
    };
    out.sort();
    tracing::debug!(
        "{} segment files in {} for [{start}, {end})",
        out.len(),
        path.display()
    );
    Ok(out)
}
