use clap::Parser;

use ligolw::Value;
use ligolw_segment_query::{Cli, is_connection_error, run_cli};

const T0: i64 = 1_000_000_000;

fn dmt_url() -> eyre::Result<String> {
    let dir = std::env::current_dir()?.join("../segmentdb/tests/data/dmt");
    url::Url::from_directory_path(dir.canonicalize()?)
        .map(|u| u.to_string())
        .map_err(|_| eyre::eyre!("not an absolute path"))
}

/// Run with `args` plus a file source, returning the written document.
fn run(args: &[&str], out_name: &str) -> eyre::Result<ligolw::Element> {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join(out_name);
    let out_str = out.display().to_string();
    let url = dmt_url()?;
    let mut argv = vec!["ligolw_segment_query", "-t", url.as_str(), "-o", out_str.as_str()];
    argv.extend_from_slice(args);
    run_cli(Cli::try_parse_from(argv)?)?;
    Ok(ligolw::load_filename(Some(&out))?)
}

#[test]
fn query_segments_writes_result_document() -> eyre::Result<()> {
    let start = T0.to_string();
    let end = (T0 + 200).to_string();
    let doc = run(
        &[
            "--query-segments",
            "-s",
            &start,
            "-e",
            &end,
            "-a",
            "H1:DMT-SCIENCE:1",
            "-b",
            "H1:DMT-CALIB",
        ],
        "result.xml.gz",
    )?;

    let process = ligolw::get_table(&doc, "process")?;
    assert_eq!(process.rows.len(), 1);
    assert_eq!(process.get(0, "program"), Some(&Value::text("ligolw_segment_query")));
    assert!(process.get(0, "end_time").is_some_and(|v| !v.is_null()));

    let params = ligolw::get_table(&doc, "process_params")?;
    assert!(
        params
            .column_values("param")?
            .iter()
            .any(|v| v.as_str() == Some("--exclude-segments"))
    );

    let segment = ligolw::get_table(&doc, "segment")?;
    let starts: Vec<i64> = segment
        .column_values("start_time")?
        .iter()
        .filter_map(|v| v.as_i64())
        .collect();
    assert_eq!(starts, vec![T0, T0 + 20, T0 + 60]);
    Ok(())
}

#[test]
fn strict_off_returns_whole_segments() -> eyre::Result<()> {
    let start = (T0 + 5).to_string();
    let end = (T0 + 12).to_string();
    let doc = run(
        &["-q", "-S", "-s", &start, "-e", &end, "-a", "H1:DMT-SCIENCE"],
        "whole.xml",
    )?;
    let segment = ligolw::get_table(&doc, "segment")?;
    assert_eq!(segment.rows.len(), 1);
    assert_eq!(segment.get(0, "start_time"), Some(&Value::Int(T0)));
    assert_eq!(segment.get(0, "end_time"), Some(&Value::Int(T0 + 40)));
    Ok(())
}

#[test]
fn show_types_writes_result_table() -> eyre::Result<()> {
    let start = T0.to_string();
    let end = (T0 + 200).to_string();
    let doc = run(&["-y", "-s", &start, "-e", &end], "types.xml")?;
    let table = ligolw::get_table(&doc, "show_types_result")?;
    assert_eq!(table.rows.len(), 3);
    Ok(())
}

#[test]
fn query_segments_needs_includes() -> eyre::Result<()> {
    let cli = Cli::try_parse_from(["q", "-q", "-t", "file:///nonexistent", "-s", "1", "-e", "2"])?;
    assert!(run_cli(cli).is_err());
    Ok(())
}

#[test]
fn refused_server_is_a_connection_error() -> eyre::Result<()> {
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0")?;
        l.local_addr()?.port()
    };
    let url = format!("ldbd://127.0.0.1:{port}");
    let cli = Cli::try_parse_from(["q", "-p", "-t", url.as_str()])?;
    let err = run_cli(cli).unwrap_err();
    assert!(is_connection_error(&err), "{err}");
    Ok(())
}

#[test]
fn missing_directory_is_not_a_connection_error() -> eyre::Result<()> {
    let cli = Cli::try_parse_from(["q", "-p", "-t", "file:///nonexistent/segments"])?;
    let err = run_cli(cli).unwrap_err();
    assert!(!is_connection_error(&err));
    Ok(())
}
