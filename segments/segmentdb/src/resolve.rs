//! Resolving the segments of a possibly unversioned segment type.

use std::collections::BTreeMap;

use ligolw::Value;
use segments::{Segment, SegmentList};

use crate::{Error, QueryEngine, Result, SegmentSpec, spec::sql_quote};

/// Active segments and coverage of one version of a segment type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSegments {
    pub active: SegmentList,
    pub coverage: SegmentList,
}

/// Combine the versions of a segment type over `window`.
///
/// Versions are visited from highest to lowest. Each contributes its active
/// segments inside the part of the window not yet covered by a higher
/// version, and then removes its own coverage from what remains.
pub fn resolve_versions(window: Segment, by_version: &BTreeMap<u32, VersionSegments>) -> SegmentList {
    let mut mask = SegmentList::new(vec![window]).coalesced();
    let mut result = SegmentList::empty();
    for (version, segs) in by_version.iter().rev() {
        if mask.is_empty() {
            tracing::trace!("mask empty before version {version}");
            break;
        }
        result = &result | &(&segs.active & &mask);
        mask = &mask - &segs.coverage;
    }
    result
}

pub(crate) fn int_value(column: &'static str, v: &Value) -> Result<i64> {
    v.as_i64().ok_or_else(|| Error::UnexpectedValue {
        column,
        value: v.clone(),
    })
}

pub(crate) fn version_value(v: &Value) -> Result<Option<u32>> {
    match v {
        Value::Null => Ok(None),
        other => {
            let n = int_value("version", other)?;
            u32::try_from(n).map(Some).map_err(|_| Error::UnexpectedValue {
                column: "version",
                value: other.clone(),
            })
        }
    }
}

/// The join condition between `segment_definer` and `table`.
pub(crate) fn def_join(engine: &dyn QueryEngine, table: &str) -> String {
    let mut cond = format!("{table}.segment_def_id = segment_definer.segment_def_id");
    if engine.joins_on_creator_db() {
        cond.push_str(&format!(" AND {table}.segment_def_cdb = segment_definer.creator_db"));
    }
    cond
}

/// Condition selecting rows of `table` overlapping `window`.
pub(crate) fn overlaps(table: &str, window: Segment) -> String {
    format!(
        "{table}.start_time < {} AND {table}.end_time > {}",
        window.end(),
        window.start()
    )
}

fn select_by_version(
    engine: &mut dyn QueryEngine,
    table: &str,
    window: Segment,
    spec: &SegmentSpec,
) -> Result<Vec<(Option<u32>, Segment)>> {
    let mut sql = format!(
        "SELECT segment_definer.version, {table}.start_time, {table}.end_time \
         FROM segment_definer, {table} \
         WHERE {} AND segment_definer.ifos = {} AND segment_definer.name = {} AND {}",
        def_join(engine, table),
        sql_quote(&spec.ifo),
        sql_quote(&spec.name),
        overlaps(table, window),
    );
    if let Some(version) = spec.version {
        sql.push_str(&format!(" AND segment_definer.version = {version}"));
    }
    engine
        .query(&sql)?
        .iter()
        .map(|row| {
            if row.len() != 3 {
                return Err(Error::Protocol(format!(
                    "expected 3 columns, got {}",
                    row.len()
                )));
            }
            let version = version_value(&row[0])?;
            let start = int_value("start_time", &row[1])?;
            let end = int_value("end_time", &row[2])?;
            Ok((version, Segment::new(start, end)))
        })
        .collect()
}

/// Keep whole every segment of `list` that overlaps `window`.
fn overlapping_whole(list: &SegmentList, window: Segment) -> SegmentList {
    list.iter().filter(|s| s.intersects(&window)).copied().collect()
}

/// Query the coverage and active segments of `spec` in `window`.
///
/// Returns `(summary, active)`. The summary is the coverage of every version
/// of the type. With `strict`, both are clipped to the window; otherwise
/// every coalesced segment overlapping the window is returned whole.
pub fn build_segment_list(
    engine: &mut dyn QueryEngine,
    window: Segment,
    spec: &SegmentSpec,
    strict: bool,
) -> Result<(SegmentList, SegmentList)> {
    let summaries = select_by_version(engine, "segment_summary", window, spec)?;
    let actives = select_by_version(engine, "segment", window, spec)?;
    tracing::debug!(
        "{spec}: {} summary rows, {} segment rows",
        summaries.len(),
        actives.len()
    );

    let coverage: SegmentList = summaries.iter().map(|(_, s)| *s).collect();
    let active = match spec.version {
        Some(_) => actives.iter().map(|(_, s)| *s).collect(),
        None => {
            let mut by_version: BTreeMap<u32, VersionSegments> = BTreeMap::new();
            for (version, seg) in summaries.iter() {
                let entry = by_version.entry(version.unwrap_or(0)).or_default();
                entry.coverage = entry.coverage.union(&SegmentList::new(vec![*seg]));
            }
            for (version, seg) in actives.iter() {
                let entry = by_version.entry(version.unwrap_or(0)).or_default();
                entry.active = entry.active.union(&SegmentList::new(vec![*seg]));
            }
            // Without clipping, resolve over everything fetched so that
            // segments crossing the window edges survive whole.
            let resolve_window = if strict {
                window
            } else {
                coverage
                    .union(&actives.iter().map(|(_, s)| *s).collect())
                    .extent()
                    .map(|e| e.hull(&window))
                    .unwrap_or(window)
            };
            resolve_versions(resolve_window, &by_version)
        }
    };

    if strict {
        Ok((coverage.clip(window), active.clip(window)))
    } else {
        Ok((
            overlapping_whole(&coverage, window),
            overlapping_whole(&active, window),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn list(segs: &[(i64, i64)]) -> SegmentList {
        segs.iter().map(|s| Segment::from(*s)).collect()
    }

    #[test]
    fn higher_version_claims_its_coverage() {
        let mut by_version = BTreeMap::new();
        by_version.insert(
            2,
            VersionSegments {
                active: list(&[(10, 20)]),
                coverage: list(&[(0, 100)]),
            },
        );
        by_version.insert(
            1,
            VersionSegments {
                active: list(&[(15, 40)]),
                coverage: list(&[(0, 100)]),
            },
        );
        let r = resolve_versions(Segment::new(0, 100), &by_version);
        assert_eq!(r, list(&[(10, 20)]));
    }

    #[test]
    fn lower_version_fills_gaps() {
        let mut by_version = BTreeMap::new();
        by_version.insert(
            3,
            VersionSegments {
                active: list(&[(10, 20)]),
                coverage: list(&[(0, 50)]),
            },
        );
        by_version.insert(
            1,
            VersionSegments {
                active: list(&[(15, 40), (60, 90)]),
                coverage: list(&[(0, 100)]),
            },
        );
        let r = resolve_versions(Segment::new(0, 80), &by_version);
        assert_eq!(r, list(&[(10, 20), (60, 80)]));
        assert!(r.is_coalesced());
    }

    #[test]
    fn coverage_without_segments_still_masks() {
        let mut by_version = BTreeMap::new();
        by_version.insert(
            2,
            VersionSegments {
                active: SegmentList::empty(),
                coverage: list(&[(0, 30)]),
            },
        );
        by_version.insert(
            1,
            VersionSegments {
                active: list(&[(0, 100)]),
                coverage: list(&[(0, 100)]),
            },
        );
        let r = resolve_versions(Segment::new(0, 100), &by_version);
        assert_eq!(r, list(&[(30, 100)]));
    }

    #[test]
    fn version_values() {
        assert_eq!(version_value(&Value::Null).unwrap(), None);
        assert_eq!(version_value(&Value::Int(4)).unwrap(), Some(4));
        assert!(version_value(&Value::Int(-1)).is_err());
        assert!(version_value(&Value::text("x")).is_err());
    }
}
