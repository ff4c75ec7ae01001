//! Print the tables found in LIGO Light Weight XML files as wiki or HTML
//! text.
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use clap::{Parser, ValueEnum};
use eyre::{Result, WrapErr};

use ligolw::{
    Element,
    print_tables::{OutputFormat, PrintOptions, print_tables},
};

/// Convert the tables of one or more LIGO_LW XML files to wiki or HTML
/// tables.
///
/// Files ending in `.gz` are decompressed. With no input files, or a single
/// `-`, the document is read from stdin.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Input files.
    files: Vec<PathBuf>,

    /// Write to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format.
    #[arg(short = 'f', long, value_enum)]
    output_format: Format,

    /// Merge all input documents and print their tables once.
    #[arg(short, long)]
    merge_docs: bool,

    /// Only print this table. May be given more than once.
    #[arg(short, long = "table")]
    tables: Vec<String>,

    /// Round floats to `--decimal-places` places.
    #[arg(short, long)]
    round_floats: bool,

    /// Number of decimal places used by `--round-floats`.
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8))]
    decimal_places: u8,

    /// Do not print table names as captions.
    #[arg(short, long)]
    no_table_names: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum, Debug)]
enum Format {
    Wiki,
    Html,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Wiki => OutputFormat::Wiki,
            Format::Html => OutputFormat::Html,
        }
    }
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn load(path: &Path) -> Result<Element> {
    if is_stdin(path) {
        ligolw::load_filename::<&Path>(None).wrap_err("reading stdin")
    } else {
        ligolw::load_filename(Some(path)).wrap_err_with(|| format!("reading {}", path.display()))
    }
}

pub fn run_cli(cli: Cli) -> Result<()> {
    let inputs = if cli.files.is_empty() {
        vec![PathBuf::from("-")]
    } else {
        cli.files.clone()
    };

    let mut opts = PrintOptions::new(cli.output_format.into());
    opts.tables = cli.tables.clone();
    opts.round_floats = cli.round_floats;
    opts.decimal_places = cli.decimal_places;
    opts.print_table_names = !cli.no_table_names;

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).wrap_err_with(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };

    let title_of = |path: &Path| (!is_stdin(path)).then(|| path.display().to_string());

    if cli.merge_docs {
        let docs = inputs
            .iter()
            .map(|p| load(p))
            .collect::<Result<Vec<_>>>()?;
        let doc = ligolw::merge_documents(docs)?;
        let titles: Vec<String> = inputs.iter().filter_map(|p| title_of(p)).collect();
        opts.title = (!titles.is_empty()).then(|| titles.join(","));
        print_tables(&doc, &mut out, &opts)?;
    } else {
        for path in inputs.iter() {
            let doc = load(path)?;
            opts.title = title_of(path);
            print_tables(&doc, &mut out, &opts)
                .wrap_err_with(|| format!("printing {}", path.display()))?;
        }
    }
    out.flush()?;
    tracing::debug!("printed {} input(s)", inputs.len());
    Ok(())
}
