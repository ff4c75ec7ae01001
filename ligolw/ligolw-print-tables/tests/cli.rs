use clap::Parser;

use ligolw_print_tables::{Cli, run_cli};

const SUMMARY: &str = "tests/data/summary.xml";

fn run(args: &[&str]) -> eyre::Result<String> {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("out.txt");
    let out_str = out.display().to_string();
    let mut argv = vec!["ligolw_print_tables", "-o", out_str.as_str()];
    argv.extend_from_slice(args);
    run_cli(Cli::try_parse_from(argv)?)?;
    Ok(std::fs::read_to_string(&out)?)
}

#[test]
fn wiki_with_rounding() -> eyre::Result<()> {
    let text = run(&["-f", "wiki", "-r", "-t", "summary", SUMMARY])?;
    let expected = format!(
        "= {SUMMARY} =\n\
         '''summary'''\n\
         ||'''ifo'''||'''snr'''||'''page'''||\n\
         ||H1||8.46||[https://ldas-jobs.example.org/~user/followup/H1.html H1.html]||\n\
         ||L1||4.20e-4||none||\n\
         \n"
    );
    assert_eq!(text, expected);
    Ok(())
}

#[test]
fn html_all_tables_without_names() -> eyre::Result<()> {
    let text = run(&["--output-format", "html", "--no-table-names", SUMMARY])?;
    assert!(text.starts_with(&format!("<h1>{SUMMARY}</h1>\n<table border=\"1\">\n")));
    assert_eq!(text.matches("<table border=\"1\">").count(), 2);
    assert!(!text.contains("<caption>"));
    assert!(text.contains("<td>a &amp; b</td>"));
    assert!(text.contains("<td>8.4567</td>"));
    Ok(())
}

#[test]
fn merged_documents_print_once() -> eyre::Result<()> {
    let text = run(&["-f", "wiki", "-m", "-t", "notes", SUMMARY, SUMMARY])?;
    assert!(text.starts_with(&format!("= {SUMMARY},{SUMMARY} =\n")));
    assert_eq!(text.matches("||a & b||").count(), 2);
    assert_eq!(text.matches("'''notes'''").count(), 1);
    Ok(())
}

#[test]
fn unknown_table_fails() {
    assert!(run(&["-f", "wiki", "-t", "sngl_burst", SUMMARY]).is_err());
}

#[test]
fn output_format_is_required() {
    assert!(Cli::try_parse_from(["ligolw_print_tables", SUMMARY]).is_err());
}

#[test]
fn decimal_places_out_of_range_is_a_usage_error() {
    let parse = |places: &str| {
        Cli::try_parse_from(["ligolw_print_tables", "-f", "wiki", "-r", "--decimal-places", places, SUMMARY])
    };
    assert!(parse("2147483648").is_err());
    assert!(parse("256").is_err());
    assert!(parse("255").is_ok());
}
