//! The query modes: ping, show types, query types and query segments.
//!
//! Each mode reads from a [QueryEngine] and writes its result as tables into
//! a LIGO_LW document.

use std::{collections::BTreeMap, io::Write};

use ligolw::{
    Element, Table, Value,
    lsctables::{SEGMENT, SEGMENT_DEFINER, SEGMENT_SUMMARY, SHOW_TYPES_RESULT, TableDef},
};
use segments::{Segment, SegmentList};

use crate::{
    Error, QueryEngine, Result, SegmentSpec, build_segment_list,
    resolve::{def_join, int_value, overlaps, version_value},
};

/// Write the engine's reply to a ping.
pub fn run_ping<W: Write>(engine: &mut dyn QueryEngine, out: &mut W) -> Result<()> {
    let reply = engine.ping()?;
    writeln!(out, "{}", reply.trim_end())?;
    Ok(())
}

/// A segment type together with the comments of its definer and summary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct TypeKey {
    ifos: String,
    name: String,
    version: Option<u32>,
    definer_comment: Option<String>,
    summary_comment: Option<String>,
}

fn text_value(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Summaries overlapping `window`, grouped by type, with coalesced coverage.
fn query_types(
    engine: &mut dyn QueryEngine,
    window: Segment,
    includes: &[SegmentSpec],
) -> Result<BTreeMap<TypeKey, SegmentList>> {
    let mut sql = format!(
        "SELECT segment_definer.ifos, segment_definer.name, segment_definer.version, \
         segment_definer.comment, segment_summary.start_time, segment_summary.end_time, \
         segment_summary.comment \
         FROM segment_definer, segment_summary \
         WHERE {} AND {}",
        def_join(engine, "segment_summary"),
        overlaps("segment_summary", window),
    );
    if !includes.is_empty() {
        let clauses: Vec<String> = includes.iter().map(SegmentSpec::to_sql_clause).collect();
        sql.push_str(&format!(" AND ({})", clauses.join(" OR ")));
    }

    let mut types: BTreeMap<TypeKey, SegmentList> = BTreeMap::new();
    for row in engine.query(&sql)? {
        if row.len() != 7 {
            return Err(Error::Protocol(format!(
                "expected 7 columns, got {}",
                row.len()
            )));
        }
        let key = TypeKey {
            ifos: text_value(&row[0]).unwrap_or_default().trim().to_string(),
            name: text_value(&row[1]).unwrap_or_default(),
            version: version_value(&row[2])?,
            definer_comment: text_value(&row[3]),
            summary_comment: text_value(&row[6]),
        };
        let seg = Segment::new(
            int_value("start_time", &row[4])?,
            int_value("end_time", &row[5])?,
        );
        let coverage = types.entry(key).or_default();
        *coverage = coverage.union(&SegmentList::new(vec![seg]));
    }
    tracing::debug!("{} segment types found", types.len());
    Ok(types)
}

fn or_dash(s: &Option<String>) -> Value {
    Value::text(s.as_deref().unwrap_or("-"))
}

fn opt_text(s: &Option<String>) -> Value {
    s.as_ref().map(|s| Value::text(s.as_str())).unwrap_or(Value::Null)
}

fn version_cell(v: Option<u32>) -> Value {
    v.map(|v| Value::Int(v.into())).unwrap_or(Value::Null)
}

/// List the segment types with coverage in `window`.
pub fn run_show_types(doc: &mut Element, engine: &mut dyn QueryEngine, window: Segment) -> Result<()> {
    let types = query_types(engine, window, &[])?;
    let mut table = SHOW_TYPES_RESULT.new_table(None)?;
    for (key, coverage) in types.iter() {
        for seg in coverage.iter() {
            table.append_named(&[
                ("ifos", Value::text(key.ifos.as_str())),
                ("name", Value::text(key.name.as_str())),
                ("version", version_cell(key.version)),
                ("segment_definer_comment", or_dash(&key.definer_comment)),
                ("segment_summary_start_time", Value::Int(seg.start())),
                ("segment_summary_end_time", Value::Int(seg.end())),
                ("segment_summary_comment", or_dash(&key.summary_comment)),
            ])?;
        }
    }
    tracing::info!("{} show_types_result rows", table.rows.len());
    ligolw::append_table(doc, &table)?;
    Ok(())
}

/// An existing table of `doc`, or a new empty one.
fn table_or_new(doc: &Element, def: &TableDef) -> Result<Table> {
    match ligolw::get_table(doc, def.name) {
        Ok(t) => Ok(t),
        Err(ligolw::Error::TableNotFound(_)) => Ok(def.new_table(None)?),
        Err(e) => Err(e.into()),
    }
}

/// Rows of the segment bookkeeping tables under construction.
struct SegmentTables {
    process_id: String,
    definer: Table,
    summary: Table,
    segment: Option<Table>,
}

impl SegmentTables {
    fn new(doc: &Element, process_id: &str, with_segments: bool) -> Result<Self> {
        Ok(Self {
            process_id: process_id.to_string(),
            definer: table_or_new(doc, &SEGMENT_DEFINER)?,
            summary: table_or_new(doc, &SEGMENT_SUMMARY)?,
            segment: if with_segments {
                Some(table_or_new(doc, &SEGMENT)?)
            } else {
                None
            },
        })
    }

    fn process(&self) -> Value {
        Value::Ilwd(self.process_id.clone())
    }

    fn add_definer(
        &mut self,
        ifos: &str,
        name: &str,
        version: Option<u32>,
        comment: &Option<String>,
    ) -> Result<String> {
        let def_id = self.definer.next_id("segment_def_id");
        let process = self.process();
        self.definer.append_named(&[
            ("process_id", process),
            ("segment_def_id", Value::Ilwd(def_id.clone())),
            ("ifos", Value::text(ifos)),
            ("name", Value::text(name)),
            ("version", version_cell(version)),
            ("comment", opt_text(comment)),
        ])?;
        Ok(def_id)
    }

    fn add_summaries(
        &mut self,
        def_id: &str,
        coverage: &SegmentList,
        comment: &Option<String>,
    ) -> Result<()> {
        let process = self.process();
        for seg in coverage.iter() {
            let sum_id = self.summary.next_id("segment_sum_id");
            self.summary.append_named(&[
                ("process_id", process.clone()),
                ("segment_sum_id", Value::Ilwd(sum_id)),
                ("start_time", Value::Int(seg.start())),
                ("start_time_ns", Value::Int(0)),
                ("end_time", Value::Int(seg.end())),
                ("end_time_ns", Value::Int(0)),
                ("comment", opt_text(comment)),
                ("segment_def_id", Value::Ilwd(def_id.to_string())),
            ])?;
        }
        Ok(())
    }

    fn add_segments(&mut self, def_id: &str, active: &SegmentList) -> Result<()> {
        let process = self.process();
        let Some(table) = self.segment.as_mut() else {
            return Ok(());
        };
        for seg in active.iter() {
            let seg_id = table.next_id("segment_id");
            table.append_named(&[
                ("process_id", process.clone()),
                ("segment_id", Value::Ilwd(seg_id)),
                ("start_time", Value::Int(seg.start())),
                ("start_time_ns", Value::Int(0)),
                ("end_time", Value::Int(seg.end())),
                ("end_time_ns", Value::Int(0)),
                ("segment_def_id", Value::Ilwd(def_id.to_string())),
            ])?;
        }
        Ok(())
    }

    fn store(self, doc: &mut Element) -> Result<()> {
        ligolw::replace_table(doc, &self.definer)?;
        ligolw::replace_table(doc, &self.summary)?;
        if let Some(segment) = &self.segment {
            ligolw::replace_table(doc, segment)?;
        }
        Ok(())
    }
}

/// Write `segment_definer` and `segment_summary` rows for the segment types
/// with coverage in `window`, optionally restricted to `includes`.
pub fn run_query_types(
    doc: &mut Element,
    process_id: &str,
    engine: &mut dyn QueryEngine,
    window: Segment,
    includes: &[SegmentSpec],
) -> Result<()> {
    let types = query_types(engine, window, includes)?;
    let mut tables = SegmentTables::new(doc, process_id, false)?;
    for (key, coverage) in types.iter() {
        let def_id = tables.add_definer(&key.ifos, &key.name, key.version, &key.definer_comment)?;
        tables.add_summaries(&def_id, &coverage.clip(window), &key.summary_comment)?;
    }
    tables.store(doc)
}

/// The distinct interferometers of `specs`, concatenated in first-seen order.
fn joined_ifos(specs: &[SegmentSpec]) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for spec in specs {
        if !seen.contains(&spec.ifo.as_str()) {
            seen.push(&spec.ifo);
        }
    }
    seen.concat()
}

/// Compute `union(includes) - union(excludes)` over `window`.
///
/// Each include gets its own definer and summary rows. The combined result
/// is written as the segments of a definer called `result`, whose summary is
/// the window. Returns the result.
pub fn run_query_segments(
    doc: &mut Element,
    process_id: &str,
    engine: &mut dyn QueryEngine,
    window: Segment,
    includes: &[SegmentSpec],
    excludes: &[SegmentSpec],
    strict: bool,
) -> Result<SegmentList> {
    let mut tables = SegmentTables::new(doc, process_id, true)?;

    let result_def_id = tables.add_definer(&joined_ifos(includes), "result", Some(0), &None)?;
    tables.add_summaries(&result_def_id, &SegmentList::new(vec![window]).coalesced(), &None)?;

    let mut included = SegmentList::empty();
    for spec in includes {
        let (summary, active) = build_segment_list(engine, window, spec, strict)?;
        let def_id = tables.add_definer(&spec.ifo, &spec.name, spec.version, &None)?;
        tables.add_summaries(&def_id, &summary, &None)?;
        included = &included | &active;
    }

    let mut excluded = SegmentList::empty();
    for spec in excludes {
        let (_, active) = build_segment_list(engine, window, spec, strict)?;
        excluded = &excluded | &active;
    }

    let result = &included - &excluded;
    tracing::info!(
        "{} result segments, {} s",
        result.len(),
        result.duration()
    );
    tables.add_segments(&result_def_id, &result)?;
    tables.store(doc)?;
    Ok(result)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ifos_first_seen() {
        let specs = vec![
            SegmentSpec::new("L1", "A", None),
            SegmentSpec::new("H1", "B", Some(1)),
            SegmentSpec::new("L1", "C", None),
        ];
        assert_eq!(joined_ifos(&specs), "L1H1");
        assert_eq!(joined_ifos(&[]), "");
    }

    #[test]
    fn text_values() {
        assert_eq!(text_value(&Value::Null), None);
        assert_eq!(text_value(&Value::text("x")).as_deref(), Some("x"));
        assert_eq!(or_dash(&None), Value::text("-"));
        assert_eq!(opt_text(&None), Value::Null);
        assert_eq!(version_cell(Some(2)), Value::Int(2));
    }
}
