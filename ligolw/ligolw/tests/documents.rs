use test_log::test;

use ligolw::{
    ElementKind, Value,
    lsctables::{SEGMENT_DEFINER, SEGMENT_SUMMARY},
    print_tables::{OutputFormat, PrintOptions, print_tables},
};

const DQ_FILE: &str = "tests/data/H1-DQ_SEGMENTS-1000000000-100.xml";

#[test]
fn load_dmt_segment_file() -> eyre::Result<()> {
    let doc = ligolw::load_filename(Some(DQ_FILE))?;
    let names: Vec<String> = ligolw::tables(&doc)
        .iter()
        .map(|t| ligolw::strip_table_name(t.get_attribute("Name").unwrap_or_default()).to_string())
        .collect();
    assert_eq!(
        names,
        vec!["process", "segment_definer", "segment_summary", "segment"]
    );

    let definer = ligolw::get_table(&doc, "segment_definer")?;
    assert_eq!(definer.comment.as_deref(), Some("data quality flags"));
    assert_eq!(definer.rows.len(), 2);
    assert_eq!(definer.get(0, "name"), Some(&Value::text("DMT-SCIENCE")));
    assert_eq!(definer.get(1, "comment"), Some(&Value::Null));

    let summary = ligolw::get_table(&doc, "segment_summary")?;
    assert!(summary.column_values("comment")?.iter().all(|v| v.is_null()));

    let segs = ligolw::get_table(&doc, "segment")?;
    let starts: Vec<i64> = segs
        .column_values("start_time")?
        .iter()
        .filter_map(|v| v.as_i64())
        .collect();
    assert_eq!(starts, vec![1000000000, 1000000060, 1000000030]);
    Ok(())
}

#[test]
fn write_and_reload_gzip() -> eyre::Result<()> {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("copy.xml.gz");
    let doc = ligolw::load_filename(Some(DQ_FILE))?;
    ligolw::write_filename(&doc, Some(&out))?;

    let mut magic = [0u8; 2];
    std::io::Read::read_exact(&mut std::fs::File::open(&out)?, &mut magic)?;
    assert_eq!(magic, [0x1f, 0x8b]);

    let back = ligolw::load_filename(Some(&out))?;
    for name in ["process", "segment_definer", "segment_summary", "segment"] {
        assert_eq!(ligolw::get_table(&back, name)?, ligolw::get_table(&doc, name)?);
    }
    Ok(())
}

#[test]
fn build_tables_from_definitions() -> eyre::Result<()> {
    let mut doc = ligolw::new_document();
    let mut definer = SEGMENT_DEFINER.new_table(None)?;
    let def_id = definer.next_id("segment_def_id");
    definer.append_named(&[
        ("segment_def_id", Value::Ilwd(def_id.clone())),
        ("ifos", Value::text("L1")),
        ("name", Value::text("result")),
        ("version", Value::Int(0)),
    ])?;
    let mut summary = SEGMENT_SUMMARY.new_table(None)?;
    summary.append_named(&[
        ("segment_sum_id", Value::Ilwd(summary.next_id("segment_sum_id"))),
        ("start_time", Value::Int(5)),
        ("end_time", Value::Int(10)),
        ("segment_def_id", Value::Ilwd(def_id)),
    ])?;
    ligolw::append_table(&mut doc, &definer)?;
    ligolw::append_table(&mut doc, &summary)?;

    let mut buf = Vec::new();
    ligolw::write(&doc, &mut buf)?;
    let text = String::from_utf8(buf)?;
    assert!(text.starts_with(ligolw::HEADER));
    assert!(text.contains("<Column Name=\"segment_definer:segment_def_id\" Type=\"ilwd:char\""));

    let reloaded = ligolw::load_reader(text.as_bytes())?;
    assert_eq!(ligolw::get_table(&reloaded, "segment_definer")?, definer);
    assert_eq!(ligolw::get_table(&reloaded, "segment_summary")?, summary);
    Ok(())
}

#[test]
fn merge_two_files() -> eyre::Result<()> {
    let a = ligolw::load_filename(Some(DQ_FILE))?;
    let b = ligolw::load_filename(Some(DQ_FILE))?;
    let merged = ligolw::merge_documents([a, b])?;
    assert_eq!(ligolw::ligo_lw(&merged)?.kind(), ElementKind::LigoLw);
    assert_eq!(ligolw::tables(&merged).len(), 4);
    assert_eq!(ligolw::get_table(&merged, "segment")?.rows.len(), 6);
    Ok(())
}

#[test]
fn print_selected_tables_as_wiki() -> eyre::Result<()> {
    let doc = ligolw::load_filename(Some(DQ_FILE))?;
    let mut opts = PrintOptions::new(OutputFormat::Wiki);
    opts.tables = vec!["segment_definer".into()];
    let mut out = Vec::new();
    print_tables(&doc, &mut out, &opts)?;
    let text = String::from_utf8(out)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "'''segment_definer'''");
    assert_eq!(
        lines[1],
        "||'''process_id'''||'''segment_def_id'''||'''ifos'''||'''name'''||'''version'''||'''comment'''||"
    );
    assert_eq!(
        lines[2],
        "||process:process_id:0||segment_definer:segment_def_id:0||H1||DMT-SCIENCE||1||science mode||"
    );
    assert_eq!(lines.len(), 5);
    Ok(())
}
