use crate::{Element, ElementKind, Result, Table, ligo_lw_mut, new_document};

enum Item {
    Other(Element),
    Table {
        element: Element,
        table: Table,
        merged: bool,
    },
}

/// Column names and types, sorted, so that tables whose columns appear in a
/// different order still match.
fn column_key(table: &Table) -> Vec<(String, &'static str)> {
    let mut key: Vec<_> = table
        .columns
        .iter()
        .map(|c| (c.name.clone(), c.column_type.as_str()))
        .collect();
    key.sort();
    key
}

/// Combine several documents into one.
///
/// The children of every document's top-level `LIGO_LW` elements are placed,
/// in order, under a single `LIGO_LW`. Tables sharing a name and column set
/// are then reduced to the first of them, holding the rows of all of them in
/// its own column order.
pub fn merge_documents<I: IntoIterator<Item = Element>>(docs: I) -> Result<Element> {
    let mut items: Vec<Item> = Vec::new();
    let mut n_docs = 0;
    for doc in docs {
        n_docs += 1;
        let roots: Vec<Element> = doc
            .children()
            .iter()
            .filter(|c| c.kind() == ElementKind::LigoLw)
            .cloned()
            .collect();
        for root in roots {
            for child in root.children() {
                if child.kind() != ElementKind::Table {
                    items.push(Item::Other(child.clone()));
                    continue;
                }
                let table = Table::from_element(child)?;
                let existing = items.iter_mut().find_map(|item| match item {
                    Item::Table { table: t, merged, .. }
                        if t.name == table.name && column_key(t) == column_key(&table) =>
                    {
                        Some((t, merged))
                    }
                    _ => None,
                });
                match existing {
                    Some((target, merged)) => {
                        tracing::debug!(
                            "merging {} rows into table {}",
                            table.rows.len(),
                            target.name
                        );
                        let order: Vec<usize> = target
                            .columns
                            .iter()
                            .filter_map(|c| table.column_index(&c.name))
                            .collect();
                        for row in table.rows.iter() {
                            target.append_row(order.iter().map(|i| row[*i].clone()).collect())?;
                        }
                        *merged = true;
                    }
                    None => items.push(Item::Table {
                        element: child.clone(),
                        table,
                        merged: false,
                    }),
                }
            }
        }
    }
    tracing::debug!("merged {n_docs} documents into {} elements", items.len());

    let mut out = new_document();
    let root = ligo_lw_mut(&mut out)?;
    for item in items {
        let el = match item {
            Item::Other(el) => el,
            Item::Table {
                element,
                table,
                merged,
            } => {
                if merged {
                    let mut el = table.to_element()?;
                    // keep the original Name attribute, including any group prefix
                    if let Some(name) = element.get_attribute("Name") {
                        el.set_attribute("Name", name)?;
                    }
                    el
                } else {
                    element
                }
            }
        };
        root.append_child(el)?;
    }
    Ok(out)
}
