//! Query segment definitions and data-quality segments from a segment
//! database or from DMT segment files, writing the result as LIGO_LW XML.
use std::{ffi::OsString, io::Write, path::PathBuf};

use clap::{ArgGroup, Parser};
use eyre::{Result, WrapErr, bail};

use segmentdb::{
    SegmentSource, SegmentSpec, modes, parse_spec_list, register_process, set_process_end_time,
};
use segments::Segment;

const PROGRAM: &str = "ligolw_segment_query";

/// Environment variable naming the segment server used by `--database`.
pub const SERVER_ENV: &str = "LSC_SEGFIND_SERVER";

/// Environment variable naming the DMT segment directory used by
/// `--dmt-files`.
pub const DMT_ENV: &str = "DMT_SEGMENT_LOCATION";

/// Query a segment database or a tree of DMT segment files.
///
/// Exactly one mode and, except with `--ping`, a GPS time range are
/// required. Segment specifiers have the form `ifo:name`, `ifo:name:*` or
/// `ifo:name:version`; when the version is omitted or `*`, higher versions
/// take precedence over lower ones wherever they have coverage.
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["ping", "show_types", "query_types", "query_segments"]),
))]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["segment_url", "database", "dmt_files"]),
))]
pub struct Cli {
    /// Check that the segment source is reachable.
    #[arg(short, long)]
    pub ping: bool,

    /// List the segment types with coverage in the time range.
    #[arg(short = 'y', long)]
    pub show_types: bool,

    /// Write the definers and coverage of the segment types in the time
    /// range, optionally restricted by `--include-segments`.
    #[arg(short = 'u', long)]
    pub query_types: bool,

    /// Write the included segments minus the excluded ones.
    #[arg(short, long)]
    pub query_segments: bool,

    /// Segment source, `ldbd://host[:port]` or `file:///path`.
    #[arg(short = 't', long, alias = "segment", value_name = "URL")]
    pub segment_url: Option<String>,

    /// Use the segment server named by $LSC_SEGFIND_SERVER.
    #[arg(short, long)]
    pub database: bool,

    /// Use the DMT segment files below $DMT_SEGMENT_LOCATION.
    #[arg(short = 'f', long)]
    pub dmt_files: bool,

    /// Start of the time range, in GPS seconds.
    #[arg(short = 's', long, required_unless_present = "ping")]
    pub gps_start_time: Option<i64>,

    /// End of the time range, in GPS seconds.
    #[arg(short = 'e', long, required_unless_present = "ping")]
    pub gps_end_time: Option<i64>,

    /// Comma separated segment specifiers to include.
    #[arg(short = 'a', long, value_name = "SPECS")]
    pub include_segments: Option<String>,

    /// Comma separated segment specifiers to exclude.
    #[arg(short = 'b', long, value_name = "SPECS")]
    pub exclude_segments: Option<String>,

    /// Return whole segments overlapping the time range instead of clipping
    /// them to it.
    #[arg(short = 'S', long)]
    pub strict_off: bool,

    /// Write the document here instead of stdout. A `.gz` suffix compresses
    /// the output.
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Ping,
    ShowTypes,
    QueryTypes,
    QuerySegments,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.ping {
            Mode::Ping
        } else if self.show_types {
            Mode::ShowTypes
        } else if self.query_types {
            Mode::QueryTypes
        } else {
            Mode::QuerySegments
        }
    }

    fn source(&self) -> Result<SegmentSource> {
        self.source_from(std::env::var(SERVER_ENV).ok(), std::env::var_os(DMT_ENV))
    }

    /// The segment source given the values of $LSC_SEGFIND_SERVER and
    /// $DMT_SEGMENT_LOCATION.
    fn source_from(&self, server: Option<String>, dmt: Option<OsString>) -> Result<SegmentSource> {
        if let Some(url) = &self.segment_url {
            return Ok(SegmentSource::from_url(url)?);
        }
        if self.database {
            let server = server.ok_or_else(|| eyre::eyre!("--database requires ${SERVER_ENV}"))?;
            let url = if server.contains("://") {
                server
            } else {
                format!("ldbd://{server}")
            };
            return Ok(SegmentSource::from_url(&url)?);
        }
        let dir = dmt.ok_or_else(|| eyre::eyre!("--dmt-files requires ${DMT_ENV}"))?;
        Ok(SegmentSource::Files(dir.into()))
    }

    fn window(&self) -> Result<Option<Segment>> {
        match (self.gps_start_time, self.gps_end_time) {
            (Some(start), Some(end)) => {
                if start >= end {
                    bail!("GPS start time {start} must be before GPS end time {end}");
                }
                Ok(Some(Segment::new(start, end)))
            }
            (None, None) if self.mode() == Mode::Ping => Ok(None),
            _ => bail!("--gps-start-time and --gps-end-time are required"),
        }
    }

    /// The options given on the command line, as `process_params` rows.
    fn process_params(&self) -> Vec<(String, String, String)> {
        let mut params = Vec::new();
        let mut add = |name: &str, ty: &str, value: String| {
            params.push((format!("--{name}"), ty.to_string(), value));
        };
        for (name, set) in [
            ("ping", self.ping),
            ("show-types", self.show_types),
            ("query-types", self.query_types),
            ("query-segments", self.query_segments),
            ("database", self.database),
            ("dmt-files", self.dmt_files),
            ("strict-off", self.strict_off),
        ] {
            if set {
                add(name, "lstring", String::new());
            }
        }
        if let Some(url) = &self.segment_url {
            add("segment-url", "lstring", url.clone());
        }
        if let Some(t) = self.gps_start_time {
            add("gps-start-time", "int_8s", t.to_string());
        }
        if let Some(t) = self.gps_end_time {
            add("gps-end-time", "int_8s", t.to_string());
        }
        if let Some(s) = &self.include_segments {
            add("include-segments", "lstring", s.clone());
        }
        if let Some(s) = &self.exclude_segments {
            add("exclude-segments", "lstring", s.clone());
        }
        if let Some(p) = &self.output_file {
            add("output-file", "lstring", p.display().to_string());
        }
        params
    }
}

fn specs(arg: &Option<String>) -> Result<Vec<SegmentSpec>> {
    match arg {
        Some(s) => Ok(parse_spec_list(s)?),
        None => Ok(Vec::new()),
    }
}

/// True if `err` means the segment source could not be reached.
pub fn is_connection_error(err: &eyre::Report) -> bool {
    err.downcast_ref::<segmentdb::Error>()
        .is_some_and(segmentdb::Error::is_connection_error)
}

pub fn run_cli(cli: Cli) -> Result<()> {
    let mode = cli.mode();
    let window = cli.window()?;
    let includes = specs(&cli.include_segments)?;
    let excludes = specs(&cli.exclude_segments)?;
    if mode == Mode::QuerySegments && includes.is_empty() {
        bail!("--query-segments requires --include-segments");
    }
    let source = cli.source()?;
    tracing::debug!("mode {mode:?}, source {source:?}, window {window:?}");

    // Not wrapped: `is_connection_error` downcasts this error.
    let mut engine = segmentdb::connect(&source, window)?;

    if mode == Mode::Ping {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        modes::run_ping(engine.as_mut(), &mut out)?;
        out.flush()?;
        return Ok(());
    }
    let Some(window) = window else {
        bail!("--gps-start-time and --gps-end-time are required");
    };

    let mut doc = ligolw::new_document();
    let process_id = register_process(
        &mut doc,
        PROGRAM,
        env!("CARGO_PKG_VERSION"),
        &cli.process_params(),
        None,
    )?;

    match mode {
        Mode::ShowTypes => modes::run_show_types(&mut doc, engine.as_mut(), window)?,
        Mode::QueryTypes => {
            modes::run_query_types(&mut doc, &process_id, engine.as_mut(), window, &includes)?
        }
        Mode::QuerySegments => {
            let result = modes::run_query_segments(
                &mut doc,
                &process_id,
                engine.as_mut(),
                window,
                &includes,
                &excludes,
                !cli.strict_off,
            )?;
            tracing::info!("{} s of segments in {window}", result.duration());
        }
        Mode::Ping => {}
    }

    set_process_end_time(&mut doc, &process_id)?;
    ligolw::write_filename(&doc, cli.output_file.as_ref()).wrap_err_with(|| match &cli.output_file {
        Some(p) => format!("writing {}", p.display()),
        None => "writing stdout".to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mode_is_required_and_exclusive() {
        assert!(Cli::try_parse_from(["q", "-t", "file:///x", "-s", "1", "-e", "2"]).is_err());
        assert!(Cli::try_parse_from(["q", "-p", "-y", "-t", "file:///x"]).is_err());
        assert!(Cli::try_parse_from(["q", "-p", "-t", "file:///x"]).is_ok());
    }

    #[test]
    fn source_is_required_and_exclusive() {
        assert!(Cli::try_parse_from(["q", "-p"]).is_err());
        assert!(Cli::try_parse_from(["q", "-p", "-d", "-f"]).is_err());
    }

    #[test]
    fn segment_is_an_alias_of_segment_url() {
        let cli = Cli::try_parse_from(["q", "-p", "--segment", "ldbd://host:30015"]).unwrap();
        assert_eq!(cli.segment_url.as_deref(), Some("ldbd://host:30015"));
    }

    #[test]
    fn database_reads_server_variable() {
        let cli = Cli::try_parse_from(["q", "-p", "-d"]).unwrap();
        let bare = cli.source_from(Some("segdb.example.org:30020".into()), None).unwrap();
        let full = cli
            .source_from(Some("ldbd://segdb.example.org:30020".into()), None)
            .unwrap();
        for source in [bare, full] {
            let SegmentSource::Ldbd(url) = source else {
                panic!("expected an ldbd source");
            };
            assert_eq!(url.host_str(), Some("segdb.example.org"));
            assert_eq!(url.port(), Some(30020));
        }
        assert!(cli.source_from(None, Some("/data".into())).is_err());
    }

    #[test]
    fn dmt_files_reads_location_variable() {
        let cli = Cli::try_parse_from(["q", "-p", "-f"]).unwrap();
        let source = cli.source_from(None, Some("/data/dmt".into())).unwrap();
        assert!(matches!(source, SegmentSource::Files(p) if p == PathBuf::from("/data/dmt")));
        assert!(cli.source_from(Some("segdb.example.org".into()), None).is_err());
    }

    #[test]
    fn times_required_except_for_ping() {
        assert!(Cli::try_parse_from(["q", "-y", "-t", "file:///x"]).is_err());
        assert!(Cli::try_parse_from(["q", "-y", "-t", "file:///x", "-s", "10"]).is_err());
        let cli = Cli::try_parse_from(["q", "-y", "-t", "file:///x", "-s", "10", "-e", "5"]).unwrap();
        assert!(cli.window().is_err());
    }

    #[test]
    fn params_record_given_options() {
        let cli = Cli::try_parse_from([
            "q", "-q", "-t", "file:///x", "-s", "10", "-e", "20", "-a", "H1:A",
        ])
        .unwrap();
        let params = cli.process_params();
        let names: Vec<&str> = params.iter().map(|p| p.0.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "--query-segments",
                "--segment-url",
                "--gps-start-time",
                "--gps-end-time",
                "--include-segments"
            ]
        );
        assert_eq!(params[2].2, "10");
    }
}
