//! Definitions of the standard tables used for segment bookkeeping.

use crate::{Column, ColumnType, Error, Result, Table};

use ColumnType::{IlwdChar, Int4s, Lstring};

/// The name, columns and id column of a well-known table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [(&'static str, ColumnType)],
    pub id_column: Option<&'static str>,
}

impl TableDef {
    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, t)| *t)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> {
        self.columns.iter().map(|(name, _)| *name)
    }

    /// An empty table with the named columns, in the order given, or all
    /// columns in definition order when `columns` is `None`.
    pub fn new_table(&self, columns: Option<&[&str]>) -> Result<Table> {
        let columns = match columns {
            None => self
                .columns
                .iter()
                .map(|(name, t)| Column::new(*name, *t))
                .collect(),
            Some(names) => names
                .iter()
                .map(|name| {
                    self.column_type(name)
                        .map(|t| Column::new(*name, t))
                        .ok_or_else(|| Error::Table {
                            table: self.name.to_string(),
                            msg: format!("no column {name}"),
                        })
                })
                .collect::<Result<Vec<_>>>()?,
        };
        Ok(Table::new(self.name, columns))
    }
}

pub const PROCESS: TableDef = TableDef {
    name: "process",
    columns: &[
        ("program", Lstring),
        ("version", Lstring),
        ("cvs_repository", Lstring),
        ("cvs_entry_time", Int4s),
        ("comment", Lstring),
        ("is_online", Int4s),
        ("node", Lstring),
        ("username", Lstring),
        ("unix_procid", Int4s),
        ("start_time", Int4s),
        ("end_time", Int4s),
        ("jobid", Int4s),
        ("domain", Lstring),
        ("ifos", Lstring),
        ("process_id", IlwdChar),
    ],
    id_column: Some("process_id"),
};

pub const PROCESS_PARAMS: TableDef = TableDef {
    name: "process_params",
    columns: &[
        ("program", Lstring),
        ("process_id", IlwdChar),
        ("param", Lstring),
        ("type", Lstring),
        ("value", Lstring),
    ],
    id_column: None,
};

pub const SEGMENT_DEFINER: TableDef = TableDef {
    name: "segment_definer",
    columns: &[
        ("process_id", IlwdChar),
        ("segment_def_id", IlwdChar),
        ("ifos", Lstring),
        ("name", Lstring),
        ("version", Int4s),
        ("comment", Lstring),
    ],
    id_column: Some("segment_def_id"),
};

pub const SEGMENT_SUMMARY: TableDef = TableDef {
    name: "segment_summary",
    columns: &[
        ("process_id", IlwdChar),
        ("segment_sum_id", IlwdChar),
        ("start_time", Int4s),
        ("start_time_ns", Int4s),
        ("end_time", Int4s),
        ("end_time_ns", Int4s),
        ("comment", Lstring),
        ("segment_def_id", IlwdChar),
    ],
    id_column: Some("segment_sum_id"),
};

pub const SEGMENT: TableDef = TableDef {
    name: "segment",
    columns: &[
        ("process_id", IlwdChar),
        ("segment_id", IlwdChar),
        ("start_time", Int4s),
        ("start_time_ns", Int4s),
        ("end_time", Int4s),
        ("end_time_ns", Int4s),
        ("segment_def_id", IlwdChar),
    ],
    id_column: Some("segment_id"),
};

/// The result of listing the available segment types.
pub const SHOW_TYPES_RESULT: TableDef = TableDef {
    name: "show_types_result",
    columns: &[
        ("ifos", Lstring),
        ("name", Lstring),
        ("version", Int4s),
        ("segment_definer_comment", Lstring),
        ("segment_summary_start_time", Int4s),
        ("segment_summary_end_time", Int4s),
        ("segment_summary_comment", Lstring),
    ],
    id_column: None,
};

pub const ALL: &[TableDef] = &[
    PROCESS,
    PROCESS_PARAMS,
    SEGMENT_DEFINER,
    SEGMENT_SUMMARY,
    SEGMENT,
    SHOW_TYPES_RESULT,
];

pub fn lookup(name: &str) -> Option<&'static TableDef> {
    ALL.iter().find(|d| d.name == name)
}
