//! Render the tables of a document as wiki or HTML text.

use std::io::Write;

use crate::{Element, Error, Result, Table, Value, get_table, strip_table_name, tables};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Wiki,
    Html,
}

#[derive(Debug, Clone)]
pub struct PrintOptions {
    pub format: OutputFormat,
    /// Tables to print, in this order. Empty means every table.
    pub tables: Vec<String>,
    pub round_floats: bool,
    pub decimal_places: u8,
    pub format_links: bool,
    pub title: Option<String>,
    pub print_table_names: bool,
}

impl PrintOptions {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            tables: Vec::new(),
            round_floats: false,
            decimal_places: 2,
            format_links: true,
            title: None,
            print_table_names: true,
        }
    }
}

/// Format a float to `places` decimals, switching to exponent notation for
/// magnitudes that would otherwise round to nothing.
pub fn smart_round(value: f64, places: u8) -> String {
    let threshold = 10f64.powi(1 - i32::from(places));
    let places = usize::from(places);
    if value == 0.0 || !value.is_finite() || value.abs() >= threshold {
        format!("{value:.places$}")
    } else {
        format!("{value:.places$e}")
    }
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn link_name(url: &str) -> &str {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(url)
}

struct Printer<'a> {
    opts: &'a PrintOptions,
}

impl Printer<'_> {
    fn cell_text(&self, value: &Value) -> String {
        let fmt = self.opts.format;
        match value {
            Value::Real(r) if self.opts.round_floats => smart_round(*r, self.opts.decimal_places),
            Value::Text(s) if self.opts.format_links && s.starts_with("http") => {
                let name = link_name(s);
                match fmt {
                    OutputFormat::Wiki => format!("[{s} {name}]"),
                    OutputFormat::Html => {
                        format!("<a href=\"{}\">{}</a>", html_escape(s), html_escape(name))
                    }
                }
            }
            other => match fmt {
                OutputFormat::Wiki => other.to_string(),
                OutputFormat::Html => html_escape(&other.to_string()),
            },
        }
    }

    fn title<W: Write>(&self, out: &mut W, title: &str) -> Result<()> {
        match self.opts.format {
            OutputFormat::Wiki => writeln!(out, "= {title} =")?,
            OutputFormat::Html => writeln!(out, "<h1>{}</h1>", html_escape(title))?,
        }
        Ok(())
    }

    fn table<W: Write>(&self, out: &mut W, table: &Table) -> Result<()> {
        let names = table.column_names();
        match self.opts.format {
            OutputFormat::Wiki => {
                if self.opts.print_table_names {
                    writeln!(out, "'''{}'''", table.name)?;
                }
                let header: Vec<String> = names.iter().map(|n| format!("'''{n}'''")).collect();
                writeln!(out, "||{}||", header.join("||"))?;
                for row in table.rows.iter() {
                    let cells: Vec<String> = row.iter().map(|v| self.cell_text(v)).collect();
                    writeln!(out, "||{}||", cells.join("||"))?;
                }
                writeln!(out)?;
            }
            OutputFormat::Html => {
                writeln!(out, "<table border=\"1\">")?;
                if self.opts.print_table_names {
                    writeln!(out, "<caption>{}</caption>", html_escape(&table.name))?;
                }
                let header: String = names
                    .iter()
                    .map(|n| format!("<th>{}</th>", html_escape(n)))
                    .collect();
                writeln!(out, "<tr>{header}</tr>")?;
                for row in table.rows.iter() {
                    let cells: String = row
                        .iter()
                        .map(|v| format!("<td>{}</td>", self.cell_text(v)))
                        .collect();
                    writeln!(out, "<tr>{cells}</tr>")?;
                }
                writeln!(out, "</table>")?;
            }
        }
        Ok(())
    }
}

/// Write the tables of `doc` to `out`.
///
/// A table named in `opts.tables` that the document does not contain is an
/// error.
pub fn print_tables<W: Write>(doc: &Element, out: &mut W, opts: &PrintOptions) -> Result<()> {
    let printer = Printer { opts };
    let selected: Vec<Table> = if opts.tables.is_empty() {
        tables(doc)
            .into_iter()
            .map(Table::from_element)
            .collect::<Result<_>>()?
    } else {
        opts.tables
            .iter()
            .map(|name| get_table(doc, strip_table_name(name)))
            .collect::<Result<_>>()?
    };
    tracing::debug!("printing {} tables as {:?}", selected.len(), opts.format);

    if let Some(title) = &opts.title {
        printer.title(out, title)?;
    }
    for table in selected.iter() {
        printer.table(out, table)?;
    }
    out.flush().map_err(Error::from)
}
