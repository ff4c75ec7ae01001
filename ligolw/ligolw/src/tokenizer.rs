//! Splitting `Stream` character data into tokens, and the reverse.

use crate::{Error, Result, Value, types::format_real};

/// Split stream text on `delimiter`.
///
/// Whitespace around tokens is ignored. A token may be enclosed in double
/// quotes, in which case a backslash makes the following character literal.
/// An empty unquoted token is null (`None`). A delimiter at the very end of
/// the text does not start a new token.
pub fn tokenize(text: &str, delimiter: char) -> Result<Vec<Option<String>>> {
    let is_space = |c: char| c.is_whitespace() && c != delimiter;
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    loop {
        while chars.next_if(|c| is_space(*c)).is_some() {}
        let Some(&c) = chars.peek() else {
            break;
        };

        if c == delimiter {
            chars.next();
            tokens.push(None);
            continue;
        }

        if c == '"' {
            chars.next();
            let mut token = String::new();
            loop {
                match chars.next() {
                    Some('\\') => match chars.next() {
                        Some(escaped) => token.push(escaped),
                        None => {
                            return Err(Error::Stream(
                                "backslash at end of stream".to_string(),
                            ));
                        }
                    },
                    Some('"') => break,
                    Some(other) => token.push(other),
                    None => {
                        return Err(Error::Stream(format!(
                            "unterminated quoted token \"{token}"
                        )));
                    }
                }
            }
            while chars.next_if(|c| is_space(*c)).is_some() {}
            match chars.next() {
                None => {}
                Some(d) if d == delimiter => {}
                Some(other) => {
                    return Err(Error::Stream(format!(
                        "expected delimiter after quoted token \"{token}\", found '{other}'"
                    )));
                }
            }
            tokens.push(Some(token));
            continue;
        }

        let mut token = String::new();
        while let Some(c) = chars.next_if(|c| *c != delimiter) {
            token.push(c);
        }
        // consume the delimiter, if any
        chars.next();
        tokens.push(Some(token.trim_end().to_string()));
    }
    Ok(tokens)
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn format_token(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Int(i) => i.to_string(),
        Value::Real(r) => format_real(*r),
        Value::Text(s) | Value::Ilwd(s) => quote(s),
    }
}

/// Render rows as stream text, one row per line, each line prefixed by
/// `indent`. Every row is terminated by the delimiter so that a null in the
/// last column of the last row survives tokenizing.
pub fn dump_rows(rows: &[Vec<Value>], delimiter: char, indent: &str) -> String {
    let sep = delimiter.to_string();
    let lines: Vec<String> = rows
        .iter()
        .map(|row| {
            let cells: Vec<String> = row.iter().map(format_token).collect();
            format!("{indent}{}{delimiter}", cells.join(&sep))
        })
        .collect();
    lines.join("\n")
}

#[cfg(test)]
mod test {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn simple_tokens() {
        let t = tokenize(" 1, 2 ,3,\n 4,5,6", ',').unwrap();
        assert_eq!(t, vec![s("1"), s("2"), s("3"), s("4"), s("5"), s("6")]);
    }

    #[test]
    fn nulls_and_quotes() {
        let t = tokenize(r#""H1",,"a \"quoted\" \\ word", 7,"#, ',').unwrap();
        assert_eq!(
            t,
            vec![s("H1"), None, s(r#"a "quoted" \ word"#), s("7")]
        );
    }

    #[test]
    fn quoted_empty_string_is_not_null() {
        let t = tokenize(r#""",1"#, ',').unwrap();
        assert_eq!(t, vec![s(""), s("1")]);
    }

    #[test]
    fn empty_stream() {
        assert!(tokenize("\n\t\t", ',').unwrap().is_empty());
    }

    #[test]
    fn malformed() {
        assert!(tokenize(r#""open"#, ',').is_err());
        assert!(tokenize(r#""a" b"#, ',').is_err());
    }

    #[test]
    fn dump_then_tokenize() {
        let rows = vec![
            vec![Value::Ilwd("segment:segment_id:0".into()), Value::Int(5), Value::Null],
            vec![Value::text("with, comma"), Value::Real(0.5), Value::text("q\"")],
        ];
        let text = dump_rows(&rows, ',', "\t");
        assert_eq!(
            text,
            "\t\"segment:segment_id:0\",5,,\n\t\"with, comma\",0.5,\"q\\\"\","
        );
        let tokens = tokenize(&text, ',').unwrap();
        assert_eq!(tokens.len(), 6);
        assert_eq!(tokens[2], None);
        assert_eq!(tokens[3], s("with, comma"));
        assert_eq!(tokens[5], s("q\""));
    }
}
