//! Recording the program run in the `process` and `process_params` tables.

use ligolw::{
    Element, Value,
    lsctables::{PROCESS, PROCESS_PARAMS},
};

use crate::Result;

fn hostname() -> String {
    let mut buf = [0u8; 256];
    // SAFETY: the buffer is valid for writes of its full length.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
    if rc != 0 {
        return "localhost".to_string();
    }
    let len = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..len]).to_string()
}

fn username() -> Option<String> {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .ok()
}

/// Append a `process` row describing this program run, and one
/// `process_params` row per `(param, type, value)` entry of `params`.
///
/// Returns the new `process_id`.
pub fn register_process(
    doc: &mut Element,
    program: &str,
    version: &str,
    params: &[(String, String, String)],
    comment: Option<&str>,
) -> Result<String> {
    let mut process = match ligolw::get_table(doc, PROCESS.name) {
        Ok(t) => t,
        Err(ligolw::Error::TableNotFound(_)) => PROCESS.new_table(None)?,
        Err(e) => return Err(e.into()),
    };
    let process_id = process.next_id("process_id");
    process.append_named(&[
        ("program", Value::text(program)),
        ("version", Value::text(version)),
        ("comment", comment.map(Value::text).unwrap_or(Value::Null)),
        ("is_online", Value::Int(0)),
        ("node", Value::text(hostname())),
        ("username", username().map(Value::text).unwrap_or(Value::Null)),
        ("unix_procid", Value::Int(std::process::id().into())),
        ("start_time", Value::Int(gps_time_conversion::gps_now())),
        ("jobid", Value::Int(0)),
        ("process_id", Value::Ilwd(process_id.clone())),
    ])?;
    ligolw::replace_table(doc, &process)?;

    if !params.is_empty() {
        let mut table = match ligolw::get_table(doc, PROCESS_PARAMS.name) {
            Ok(t) => t,
            Err(ligolw::Error::TableNotFound(_)) => PROCESS_PARAMS.new_table(None)?,
            Err(e) => return Err(e.into()),
        };
        for (param, ty, value) in params {
            table.append_named(&[
                ("program", Value::text(program)),
                ("process_id", Value::Ilwd(process_id.clone())),
                ("param", Value::text(param.as_str())),
                ("type", Value::text(ty.as_str())),
                ("value", Value::text(value.as_str())),
            ])?;
        }
        ligolw::replace_table(doc, &table)?;
    }
    tracing::debug!("registered {program} as {process_id}");
    Ok(process_id)
}

/// Set the end time of process `process_id` to now.
pub fn set_process_end_time(doc: &mut Element, process_id: &str) -> Result<()> {
    let mut process = ligolw::get_table(doc, PROCESS.name)?;
    let now = gps_time_conversion::gps_now();
    let rows: Vec<usize> = process
        .column_values("process_id")?
        .iter()
        .enumerate()
        .filter(|(_, v)| v.as_str() == Some(process_id))
        .map(|(i, _)| i)
        .collect();
    for row in rows {
        process.set(row, "end_time", Value::Int(now))?;
    }
    ligolw::replace_table(doc, &process)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn register_then_finish() {
        let mut doc = ligolw::new_document();
        let params = vec![
            ("--query-segments".to_string(), "lstring".to_string(), String::new()),
            ("--gps-start-time".to_string(), "int_4s".to_string(), "1000000000".to_string()),
        ];
        let pid = register_process(&mut doc, "ligolw_segment_query", "0.1.0", &params, None).unwrap();
        assert_eq!(pid, "process:process_id:0");

        let process = ligolw::get_table(&doc, "process").unwrap();
        assert_eq!(process.rows.len(), 1);
        assert_eq!(process.get(0, "program"), Some(&Value::text("ligolw_segment_query")));
        assert_eq!(process.get(0, "end_time"), Some(&Value::Null));
        let start = process.get(0, "start_time").and_then(Value::as_i64).unwrap();
        assert!(start > 1_000_000_000);

        let pp = ligolw::get_table(&doc, "process_params").unwrap();
        assert_eq!(pp.rows.len(), 2);
        assert_eq!(pp.get(1, "value"), Some(&Value::text("1000000000")));

        set_process_end_time(&mut doc, &pid).unwrap();
        let process = ligolw::get_table(&doc, "process").unwrap();
        let end = process.get(0, "end_time").and_then(Value::as_i64).unwrap();
        assert!(end >= start);
    }

    #[test]
    fn hostname_is_not_empty() {
        assert!(!hostname().is_empty());
    }
}
