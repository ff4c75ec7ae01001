use std::{fmt, str::FromStr};

use crate::{Error, Result};

/// A segment type named as `ifo:name`, `ifo:name:*` or `ifo:name:version`.
///
/// `version` is `None` when unspecified, meaning that all versions are
/// resolved, higher versions taking precedence where they have coverage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentSpec {
    pub ifo: String,
    pub name: String,
    pub version: Option<u32>,
}

impl SegmentSpec {
    pub fn new<S1: Into<String>, S2: Into<String>>(ifo: S1, name: S2, version: Option<u32>) -> Self {
        Self {
            ifo: ifo.into(),
            name: name.into(),
            version,
        }
    }

    /// SQL condition selecting this type's `segment_definer` rows.
    pub fn to_sql_clause(&self) -> String {
        let mut clause = format!(
            "(segment_definer.ifos = {} AND segment_definer.name = {}",
            sql_quote(&self.ifo),
            sql_quote(&self.name)
        );
        if let Some(version) = self.version {
            clause.push_str(&format!(" AND segment_definer.version = {version}"));
        }
        clause.push(')');
        clause
    }
}

/// Single-quote a string literal for SQL.
pub(crate) fn sql_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl FromStr for SegmentSpec {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let bad = |msg: &str| Error::BadSpec {
            spec: s.to_string(),
            msg: msg.to_string(),
        };
        let parts: Vec<&str> = s.trim().split(':').collect();
        let (ifo, name, version) = match parts.as_slice() {
            [ifo, name] => (*ifo, *name, None),
            [ifo, name, "*"] => (*ifo, *name, None),
            [ifo, name, version] => {
                let v = version
                    .parse::<u32>()
                    .map_err(|_| bad("version must be a non-negative integer or *"))?;
                (*ifo, *name, Some(v))
            }
            _ => return Err(bad("expected ifo:name[:version]")),
        };
        if ifo.is_empty() || name.is_empty() {
            return Err(bad("empty ifo or name"));
        }
        Ok(SegmentSpec::new(ifo, name, version))
    }
}

impl fmt::Display for SegmentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(v) => write!(f, "{}:{}:{}", self.ifo, self.name, v),
            None => write!(f, "{}:{}:*", self.ifo, self.name),
        }
    }
}

/// Parse a comma-separated list of specifiers.
pub fn parse_spec_list(s: &str) -> Result<Vec<SegmentSpec>> {
    s.split(',')
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect()
}
