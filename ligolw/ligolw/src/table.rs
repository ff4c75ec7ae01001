use crate::{
    ColumnType, Element, ElementKind, Error, Result, Value, dump_rows, tokenize,
};

/// Strip the `:table` suffix (and any group prefix) from a `Table` Name
/// attribute, so that `"process:table"` and `"processgroup:process:table"`
/// both become `"process"`.
pub fn strip_table_name(name: &str) -> &str {
    let name = name.strip_suffix(":table").unwrap_or(name);
    name.rsplit(':').next().unwrap_or(name)
}

/// Strip the table prefix from a `Column` Name attribute, so that
/// `"segment:start_time"` becomes `"start_time"`.
pub fn strip_column_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new<S: Into<String>>(name: S, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// A decoded `Table` element.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
    pub comment: Option<String>,
}

impl Table {
    pub fn new<S: Into<String>>(name: S, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
            comment: None,
        }
    }

    fn err<S: Into<String>>(&self, msg: S) -> Error {
        Error::Table {
            table: self.name.clone(),
            msg: msg.into(),
        }
    }

    pub fn from_element(el: &Element) -> Result<Self> {
        if el.kind() != ElementKind::Table {
            return Err(Error::Table {
                table: String::new(),
                msg: format!("expected a Table element, found {}", el.tag_name()),
            });
        }
        let name = strip_table_name(el.get_attribute("Name").unwrap_or_default()).to_string();
        let mut table = Table::new(name, Vec::new());

        let mut stream = None;
        for child in el.children() {
            match child.kind() {
                ElementKind::Comment => table.comment = child.pcdata().map(str::to_string),
                ElementKind::Column => {
                    let col_name = child
                        .get_attribute("Name")
                        .ok_or_else(|| table.err("Column without Name"))?;
                    let column_type = child
                        .get_attribute("Type")
                        .ok_or_else(|| table.err(format!("Column {col_name} without Type")))?
                        .parse()?;
                    table
                        .columns
                        .push(Column::new(strip_column_name(col_name), column_type));
                }
                ElementKind::Stream => stream = Some(child),
                _ => {}
            }
        }

        if let Some(stream) = stream {
            let delimiter = stream
                .get_attribute("Delimiter")
                .and_then(|d| d.chars().next())
                .unwrap_or(',');
            let tokens = tokenize(stream.pcdata().unwrap_or_default(), delimiter)?;
            let ncols = table.columns.len();
            if ncols == 0 {
                if !tokens.is_empty() {
                    return Err(table.err("stream data but no columns"));
                }
            } else {
                if tokens.len() % ncols != 0 {
                    return Err(table.err(format!(
                        "{} tokens do not fill rows of {ncols} columns",
                        tokens.len()
                    )));
                }
                for chunk in tokens.chunks(ncols) {
                    let row = chunk
                        .iter()
                        .zip(table.columns.iter())
                        .map(|(tok, col)| col.column_type.parse_token(tok.as_deref()))
                        .collect::<Result<Vec<Value>>>()?;
                    table.rows.push(row);
                }
            }
        }
        Ok(table)
    }

    pub fn to_element(&self) -> Result<Element> {
        let table_name = format!("{}:table", self.name);
        let mut el = Element::with_attributes(ElementKind::Table, [("Name", table_name.as_str())])?;
        if let Some(comment) = &self.comment {
            let mut c = Element::new(ElementKind::Comment);
            c.set_pcdata(Some(comment.clone()));
            el.append_child(c)?;
        }
        for col in self.columns.iter() {
            el.append_child(Element::with_attributes(
                ElementKind::Column,
                [
                    ("Name", format!("{}:{}", self.name, col.name)),
                    ("Type", col.column_type.to_string()),
                ],
            )?)?;
        }
        let mut stream = Element::with_attributes(
            ElementKind::Stream,
            [("Name", table_name.as_str()), ("Type", "Local"), ("Delimiter", ",")],
        )?;
        if !self.rows.is_empty() {
            let body = dump_rows(&self.rows, ',', "\t\t\t");
            stream.set_pcdata(Some(format!("\n{body}\n\t\t")));
        }
        el.append_child(stream)?;
        Ok(el)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Every value of one column, in row order.
    pub fn column_values(&self, name: &str) -> Result<Vec<&Value>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| self.err(format!("no column {name}")))?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    pub fn set(&mut self, row: usize, column: &str, value: Value) -> Result<()> {
        let idx = self
            .column_index(column)
            .ok_or_else(|| self.err(format!("no column {column}")))?;
        let nrows = self.rows.len();
        let r = self
            .rows
            .get_mut(row)
            .ok_or_else(|| Error::Table {
                table: self.name.clone(),
                msg: format!("row {row} out of range ({nrows} rows)"),
            })?;
        r[idx] = value;
        Ok(())
    }

    pub fn append_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(self.err(format!(
                "row has {} values but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append a row given as `(column, value)` pairs.
    ///
    /// Columns not mentioned are null. Names of columns this table does not
    /// carry are ignored, so the same row description can be used with
    /// tables created from a subset of a definition's columns.
    pub fn append_named(&mut self, values: &[(&str, Value)]) -> Result<()> {
        let mut row = vec![Value::Null; self.columns.len()];
        for (name, value) in values {
            if let Some(idx) = self.column_index(name) {
                row[idx] = value.clone();
            }
        }
        self.append_row(row)
    }

    /// The next unused `ilwd:char` id for `column`, of the form
    /// `table:column:N`.
    pub fn next_id(&self, column: &str) -> String {
        let next = self
            .column_index(column)
            .map(|idx| {
                self.rows
                    .iter()
                    .filter_map(|r| r[idx].as_str())
                    .filter_map(|id| id.rsplit(':').next()?.parse::<u64>().ok())
                    .map(|n| n + 1)
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0);
        format!("{}:{}:{}", self.name, column, next)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn name_stripping() {
        assert_eq!(strip_table_name("segment_definer:table"), "segment_definer");
        assert_eq!(strip_table_name("processgroup:process:table"), "process");
        assert_eq!(strip_table_name("segment"), "segment");
        assert_eq!(strip_column_name("segment:start_time"), "start_time");
        assert_eq!(strip_column_name("start_time"), "start_time");
    }

    #[test]
    fn element_round_trip_keeps_nulls() -> Result<()> {
        let mut t = Table::new(
            "segment_definer",
            vec![
                Column::new("segment_def_id", ColumnType::IlwdChar),
                Column::new("name", ColumnType::Lstring),
                Column::new("version", ColumnType::Int4s),
            ],
        );
        t.comment = Some("definers".into());
        let id = t.next_id("segment_def_id");
        assert_eq!(id, "segment_definer:segment_def_id:0");
        t.append_named(&[("segment_def_id", Value::Ilwd(id)), ("name", Value::text("SCIENCE"))])?;
        t.append_named(&[
            ("segment_def_id", Value::Ilwd(t.next_id("segment_def_id"))),
            ("version", Value::Int(2)),
            ("no_such_column", Value::Int(7)),
        ])?;
        assert_eq!(t.next_id("segment_def_id"), "segment_definer:segment_def_id:2");

        let el = t.to_element()?;
        assert_eq!(el.get_attribute("Name"), Some("segment_definer:table"));
        let back = Table::from_element(&el)?;
        assert_eq!(back, t);
        assert_eq!(back.get(0, "version"), Some(&Value::Null));
        assert_eq!(back.get(1, "name"), Some(&Value::Null));
        Ok(())
    }

    #[test]
    fn ragged_stream_is_an_error() -> Result<()> {
        let t = Table::new(
            "x",
            vec![
                Column::new("a", ColumnType::Int4s),
                Column::new("b", ColumnType::Int4s),
            ],
        );
        let mut el = t.to_element()?;
        let stream_idx = el.children().len() - 1;
        el.children_mut()[stream_idx].set_pcdata(Some("1,2,3,".into()));
        assert!(Table::from_element(&el).is_err());
        Ok(())
    }

    #[test]
    fn append_row_checks_width() {
        let mut t = Table::new("x", vec![Column::new("a", ColumnType::Int4s)]);
        assert!(t.append_row(vec![Value::Int(1), Value::Int(2)]).is_err());
        assert!(t.set(0, "a", Value::Int(1)).is_err());
    }
}
