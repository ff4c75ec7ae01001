use crate::{Element, ElementKind, Error, Result, Table, strip_table_name};

/// A document holding one empty `LIGO_LW` element.
pub fn new_document() -> Element {
    let mut doc = Element::new(ElementKind::Document);
    // Document accepts LIGO_LW, so this cannot fail.
    let _ = doc.append_child(Element::new(ElementKind::LigoLw));
    doc
}

/// The first top-level `LIGO_LW` element.
pub fn ligo_lw(doc: &Element) -> Result<&Element> {
    doc.children()
        .iter()
        .find(|c| c.kind() == ElementKind::LigoLw)
        .ok_or(Error::NoLigoLw)
}

pub fn ligo_lw_mut(doc: &mut Element) -> Result<&mut Element> {
    doc.children_mut()
        .iter_mut()
        .find(|c| c.kind() == ElementKind::LigoLw)
        .ok_or(Error::NoLigoLw)
}

/// Every `Table` element anywhere in the document, in document order.
pub fn tables(doc: &Element) -> Vec<&Element> {
    let mut out = Vec::new();
    collect_tables(doc, &mut out);
    out
}

fn collect_tables<'a>(el: &'a Element, out: &mut Vec<&'a Element>) {
    if el.kind() == ElementKind::Table {
        out.push(el);
        return;
    }
    for child in el.children() {
        collect_tables(child, out);
    }
}

/// Decode the first table called `name`.
pub fn get_table(doc: &Element, name: &str) -> Result<Table> {
    tables(doc)
        .into_iter()
        .find(|t| strip_table_name(t.get_attribute("Name").unwrap_or_default()) == name)
        .ok_or_else(|| Error::TableNotFound(name.to_string()))
        .and_then(Table::from_element)
}

/// Append `table` to the document's `LIGO_LW` element.
pub fn append_table(doc: &mut Element, table: &Table) -> Result<()> {
    let el = table.to_element()?;
    ligo_lw_mut(doc)?.append_child(el)?;
    Ok(())
}

/// Replace the top-level table of the same name, or append it if there is
/// none.
pub fn replace_table(doc: &mut Element, table: &Table) -> Result<()> {
    let el = table.to_element()?;
    let root = ligo_lw_mut(doc)?;
    let existing = root.children().iter().position(|c| {
        c.kind() == ElementKind::Table
            && strip_table_name(c.get_attribute("Name").unwrap_or_default()) == table.name
    });
    match existing {
        Some(idx) => {
            root.replace_child(idx, el)?;
        }
        None => {
            root.append_child(el)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Column, ColumnType, Value};

    fn one_column(name: &str, v: i64) -> Table {
        let mut t = Table::new(name, vec![Column::new("x", ColumnType::Int4s)]);
        t.append_row(vec![Value::Int(v)]).unwrap();
        t
    }

    #[test]
    fn append_get_replace() {
        let mut doc = new_document();
        assert!(matches!(get_table(&doc, "a"), Err(Error::TableNotFound(_))));

        append_table(&mut doc, &one_column("a", 1)).unwrap();
        append_table(&mut doc, &one_column("b", 2)).unwrap();
        assert_eq!(tables(&doc).len(), 2);
        assert_eq!(get_table(&doc, "b").unwrap(), one_column("b", 2));

        replace_table(&mut doc, &one_column("a", 3)).unwrap();
        assert_eq!(tables(&doc).len(), 2);
        assert_eq!(get_table(&doc, "a").unwrap(), one_column("a", 3));

        replace_table(&mut doc, &one_column("c", 4)).unwrap();
        assert_eq!(tables(&doc).len(), 3);
    }

    #[test]
    fn missing_ligo_lw() {
        let doc = Element::new(ElementKind::Document);
        assert!(matches!(ligo_lw(&doc), Err(Error::NoLigoLw)));
    }
}
