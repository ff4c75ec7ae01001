//! A temporary SQLite database filled from LIGO_LW segment files.

use std::{collections::HashMap, path::Path};

use ligolw::{
    ColumnType, Element, Value,
    lsctables::{self, TableDef},
};
use rusqlite::{Connection, types::ValueRef};
use tempfile::NamedTempFile;

use crate::{QueryEngine, Result, Row};

/// The tables copied from the files into the database.
const LOADED_TABLES: &[TableDef] = &[
    lsctables::PROCESS,
    lsctables::SEGMENT_DEFINER,
    lsctables::SEGMENT_SUMMARY,
    lsctables::SEGMENT,
];

fn sql_type(t: ColumnType) -> &'static str {
    if t.is_integer() || t.is_ilwd() {
        "INTEGER"
    } else if t.is_real() {
        "REAL"
    } else if t == ColumnType::Blob {
        "BLOB"
    } else {
        "TEXT"
    }
}

fn to_sql_value(v: &Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as S;
    match v {
        Value::Null => S::Null,
        Value::Int(i) => S::Integer(*i),
        Value::Real(r) => S::Real(*r),
        Value::Text(s) | Value::Ilwd(s) => S::Text(s.clone()),
    }
}

fn from_sql_value(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) | ValueRef::Blob(t) => Value::Text(String::from_utf8_lossy(t).to_string()),
    }
}

/// Query engine over segment files.
///
/// The database lives in a temporary file which is removed when the engine
/// is dropped. Row ids (`ilwd:char` values such as
/// `segment_definer:segment_def_id:0`) are replaced by integers unique
/// across all loaded documents, so that joins work within a document and ids
/// from different documents never collide.
pub struct LocalEngine {
    // Declared before `db_file` so the connection closes first.
    conn: Connection,
    db_file: NamedTempFile,
    n_documents: usize,
    next_id: i64,
}

impl LocalEngine {
    /// An empty database with the segment tables created.
    pub fn new() -> Result<Self> {
        let db_file = tempfile::Builder::new()
            .prefix("segmentdb-")
            .suffix(".sqlite")
            .tempfile()?;
        let conn = Connection::open(db_file.path())?;
        let mut ddl = String::new();
        for def in LOADED_TABLES {
            let cols: Vec<String> = def
                .columns
                .iter()
                .map(|(name, t)| format!("{name} {}", sql_type(*t)))
                .collect();
            ddl.push_str(&format!("CREATE TABLE {} ({});\n", def.name, cols.join(", ")));
            if let Some(id) = def.id_column {
                ddl.push_str(&format!(
                    "CREATE INDEX {0}_{1} ON {0} ({1});\n",
                    def.name, id
                ));
            }
        }
        conn.execute_batch(&ddl)?;
        tracing::debug!("created segment database {}", db_file.path().display());
        Ok(Self {
            conn,
            db_file,
            n_documents: 0,
            next_id: 0,
        })
    }

    /// A database holding the contents of every file in `files`.
    pub fn from_files<P: AsRef<Path>>(files: &[P]) -> Result<Self> {
        let mut engine = Self::new()?;
        for path in files {
            let doc = ligolw::load_filename(Some(path.as_ref()))?;
            engine.insert_document(&doc)?;
        }
        tracing::info!("loaded {} documents", engine.n_documents);
        Ok(engine)
    }

    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    /// Copy the segment tables of `doc` into the database.
    pub fn insert_document(&mut self, doc: &Element) -> Result<()> {
        let mut ids: HashMap<String, i64> = HashMap::new();
        let mut next_id = self.next_id;
        let tx = self.conn.transaction()?;
        for el in ligolw::tables(doc) {
            let name = ligolw::strip_table_name(el.get_attribute("Name").unwrap_or_default());
            let Some(def) = LOADED_TABLES.iter().find(|d| d.name == name) else {
                continue;
            };
            let table = ligolw::Table::from_element(el)?;
            // only columns the schema knows about
            let cols: Vec<(usize, &str)> = table
                .columns
                .iter()
                .enumerate()
                .filter(|(_, c)| def.column_type(&c.name).is_some())
                .map(|(i, c)| (i, c.name.as_str()))
                .collect();
            if cols.is_empty() || table.rows.is_empty() {
                continue;
            }
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                def.name,
                cols.iter().map(|(_, n)| *n).collect::<Vec<_>>().join(", "),
                vec!["?"; cols.len()].join(", ")
            );
            let mut stmt = tx.prepare(&sql)?;
            for row in table.rows.iter() {
                let values: Vec<rusqlite::types::Value> = cols
                    .iter()
                    .map(|(i, _)| match &row[*i] {
                        Value::Ilwd(id) => {
                            let n = *ids.entry(id.clone()).or_insert_with(|| {
                                next_id += 1;
                                next_id
                            });
                            rusqlite::types::Value::Integer(n)
                        }
                        other => to_sql_value(other),
                    })
                    .collect();
                stmt.execute(rusqlite::params_from_iter(values.iter()))?;
            }
            tracing::debug!("inserted {} rows into {}", table.rows.len(), def.name);
        }
        tx.commit()?;
        self.next_id = next_id;
        self.n_documents += 1;
        Ok(())
    }
}

impl QueryEngine for LocalEngine {
    fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        tracing::debug!("local query: {sql}");
        let mut stmt = self.conn.prepare(sql)?;
        let ncols = stmt.column_count();
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let values = (0..ncols)
                .map(|i| row.get_ref(i).map(from_sql_value))
                .collect::<rusqlite::Result<Row>>()?;
            out.push(values);
        }
        Ok(out)
    }

    fn ping(&mut self) -> Result<String> {
        Ok(format!(
            "{} segment files loaded into {}",
            self.n_documents,
            self.db_file.path().display()
        ))
    }

    fn describe(&self) -> String {
        format!("local database {}", self.db_file.path().display())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ligolw::lsctables::{SEGMENT, SEGMENT_DEFINER};

    fn doc(def_name: &str, seg: (i64, i64)) -> Element {
        let mut definer = SEGMENT_DEFINER.new_table(None).unwrap();
        definer
            .append_named(&[
                ("segment_def_id", Value::Ilwd("segment_definer:segment_def_id:0".into())),
                ("ifos", Value::text("H1")),
                ("name", Value::text(def_name)),
                ("version", Value::Int(1)),
            ])
            .unwrap();
        let mut segment = SEGMENT.new_table(Some(&["segment_id", "start_time", "end_time", "segment_def_id"])).unwrap();
        segment
            .append_named(&[
                ("segment_id", Value::Ilwd("segment:segment_id:0".into())),
                ("start_time", Value::Int(seg.0)),
                ("end_time", Value::Int(seg.1)),
                ("segment_def_id", Value::Ilwd("segment_definer:segment_def_id:0".into())),
            ])
            .unwrap();
        let mut d = ligolw::new_document();
        ligolw::append_table(&mut d, &definer).unwrap();
        ligolw::append_table(&mut d, &segment).unwrap();
        d
    }

    #[test]
    fn ids_do_not_collide_between_documents() {
        let mut engine = LocalEngine::new().unwrap();
        engine.insert_document(&doc("A", (0, 10))).unwrap();
        engine.insert_document(&doc("B", (20, 30))).unwrap();
        let rows = engine
            .query(
                "SELECT segment_definer.name, segment.start_time FROM segment_definer, segment \
                 WHERE segment.segment_def_id = segment_definer.segment_def_id \
                 ORDER BY segment.start_time",
            )
            .unwrap();
        assert_eq!(
            rows,
            vec![
                vec![Value::text("A"), Value::Int(0)],
                vec![Value::text("B"), Value::Int(20)],
            ]
        );
        assert!(engine.ping().unwrap().starts_with("2 segment files"));
    }

    #[test]
    fn database_file_removed_on_drop() {
        let engine = LocalEngine::new().unwrap();
        let path = engine.db_file.path().to_path_buf();
        assert!(path.exists());
        drop(engine);
        assert!(!path.exists());
    }
}
