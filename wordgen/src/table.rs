//! The data table of a summary template.
//!
//! The table is found by its header: the first table with a cell naming a standard (`XI`,
//! `FYJC (XI)`, `SYJC`...). Every standard owns a block of columns, the columns before the first
//! block hold the serial number and the initials, and the first row after the headers is the
//! prototype cloned for every teacher. Inside a block, the sub-header names the column of every
//! field; blocks without field names take the fields in their usual order.

use crate::{
    xml::{Element, Node},
    WordError, WordResult,
};
use ledger::{Field, Standard};
use std::{collections::BTreeMap, ops::Range};
use strings::{normalize_label, tokens};

/// Run properties of the paragraph mark that are not allowed in a run
const MARK_ONLY: [&str; 5] = ["w:ins", "w:del", "w:moveFrom", "w:moveTo", "w:rPrChange"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub standard: Standard,
    /// First grid column
    pub start: usize,
    pub width: usize,
    /// Grid column of every field the block has room for
    pub columns: BTreeMap<Field, usize>,
}

impl Block {
    fn contains(&self, col: usize) -> bool {
        (self.start..self.start + self.width).contains(&col)
    }

    #[must_use]
    pub fn column(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }
}

/// Where things are inside the data table. Row numbers count `w:tr` elements only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub header_row: usize,
    pub body: Range<usize>,
    pub totals_row: Option<usize>,
    pub blocks: Vec<Block>,
    pub serial_col: Option<usize>,
    pub initials_col: Option<usize>,
}

/// Values of one field per column of a block
pub type FieldValues = BTreeMap<Field, String>;

/// Values of one teacher, per standard the teacher teaches
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    pub initials: String,
    pub values: BTreeMap<Standard, FieldValues>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableData {
    pub rows: Vec<TableRow>,
    pub totals: BTreeMap<Standard, FieldValues>,
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    /// Position inside the children of the row
    index: usize,
    col: usize,
    span: usize,
}

fn val_of(element: Option<&Element>) -> Option<usize> {
    element.and_then(|e| e.attr("w:val")).and_then(|v| v.parse().ok())
}

fn cells(row: &Element) -> Vec<Cell> {
    let mut col = val_of(
        row.child("w:trPr")
            .and_then(|properties| properties.child("w:gridBefore")),
    )
    .unwrap_or(0);

    row.children
        .iter()
        .enumerate()
        .filter_map(|(index, node)| match node {
            Node::Element(e) if e.name == "w:tc" => Some((index, e)),
            _ => None,
        })
        .map(|(index, tc)| {
            let span = val_of(tc.child("w:tcPr").and_then(|p| p.child("w:gridSpan")))
                .filter(|span| *span > 0)
                .unwrap_or(1);
            let cell = Cell { index, col, span };
            col += span;
            cell
        })
        .collect()
}

/// Text of the paragraphs of a cell. Tables nested in the cell have text of their own.
fn cell_text(row: &Element, cell: Cell) -> String {
    match row.children.get(cell.index) {
        Some(Node::Element(tc)) => normalize_label(
            &tc.elements()
                .filter(|e| e.name == "w:p")
                .flat_map(|p| p.descendants("w:t"))
                .map(Element::own_text)
                .collect::<String>(),
        ),
        _ => String::new(),
    }
}

fn markers(row: &Element) -> Vec<(Cell, Standard)> {
    cells(row)
        .into_iter()
        .filter_map(|cell| Standard::from_tokens(&tokens(&cell_text(row, cell))).map(|s| (cell, s)))
        .collect()
}

fn is_sub_header(row: &Element) -> bool {
    !markers(row).is_empty()
        || cells(row).into_iter().any(|cell| {
            let text = cell_text(row, cell);
            Field::from_header(&text).is_some()
                || matches!(
                    tokens(&text).as_slice(),
                    [t] if t == "INITIALS" || t == "INITIAL"
                )
                || matches!(tokens(&text).as_slice(), [sr, no] if sr == "SR" && no == "NO")
        })
}

/// The first cell with text says TOTAL, the cells before it are often left empty
fn is_totals(row: &Element) -> bool {
    cells(row)
        .into_iter()
        .map(|cell| cell_text(row, cell))
        .find(|text| !text.is_empty())
        .is_some_and(|text| tokens(&text).iter().any(|t| t == "TOTAL"))
}

fn table_rows(table: &Element) -> Vec<&Element> {
    table.elements().filter(|e| e.name == "w:tr").collect()
}

/// Positions of the rows inside the children of the table
fn row_positions(table: &Element) -> Vec<usize> {
    table
        .children
        .iter()
        .enumerate()
        .filter(|(_, node)| matches!(node, Node::Element(e) if e.name == "w:tr"))
        .map(|(i, _)| i)
        .collect()
}

fn has_marker(table: &Element) -> bool {
    table_rows(table).iter().any(|row| !markers(row).is_empty())
}

/// Path to the first table, in document order, with a standard marker
#[must_use]
pub fn find_data_table(root: &Element) -> Option<Vec<usize>> {
    fn walk(element: &Element, path: &mut Vec<usize>) -> bool {
        for (i, child) in element.children.iter().enumerate() {
            let Node::Element(child) = child else {
                continue;
            };

            path.push(i);
            if (child.name == "w:tbl" && has_marker(child)) || walk(child, path) {
                return true;
            }
            path.pop();
        }

        false
    }

    let mut path = Vec::new();
    walk(root, &mut path).then_some(path)
}

impl TableLayout {
    /// Read the layout of `table`
    ///
    /// # Errors
    ///
    /// [`WordError::NoDataTable`] when no row names a standard, [`WordError::NoDataRows`] when
    /// there is no row between the headers and the totals
    pub fn analyze(table: &Element) -> WordResult<TableLayout> {
        let rows = table_rows(table);
        let header_row = rows
            .iter()
            .position(|row| !markers(row).is_empty())
            .ok_or(WordError::NoDataTable)?;

        let mut body_start = header_row + 1;
        while rows.get(body_start).is_some_and(|row| is_sub_header(row)) {
            body_start += 1;
        }

        let mut blocks: Vec<Block> = Vec::new();
        for row in &rows[header_row..body_start] {
            for (cell, standard) in markers(row) {
                if blocks.iter().any(|b| b.standard == standard) {
                    continue;
                }
                blocks.push(Block {
                    standard,
                    start: cell.col,
                    width: if cell.span > 1 {
                        cell.span
                    } else {
                        Field::ALL.len()
                    },
                    columns: BTreeMap::new(),
                });
            }
        }
        blocks.sort_by_key(|b| b.start);
        let next_starts = blocks.iter().skip(1).map(|b| b.start).collect::<Vec<_>>();
        for (block, next) in blocks.iter_mut().zip(next_starts) {
            block.width = block.width.min(next.saturating_sub(block.start));
        }

        for row in &rows[header_row + 1..body_start] {
            for cell in cells(row) {
                let Some(field) = Field::from_header(&cell_text(row, cell)) else {
                    continue;
                };
                if let Some(block) = blocks.iter_mut().find(|b| b.contains(cell.col)) {
                    block.columns.entry(field).or_insert(cell.col);
                }
            }
        }
        for block in &mut blocks {
            if block.columns.is_empty() {
                block.columns = Field::ALL
                    .into_iter()
                    .zip(block.start..block.start + block.width)
                    .collect();
            }
        }

        let (serial_col, initials_col) = match blocks.first().map_or(0, |b| b.start) {
            0 => (None, None),
            1 => (None, Some(0)),
            _ => (Some(0), Some(1)),
        };

        let totals_row = (body_start..rows.len()).find(|r| is_totals(rows[*r]));
        let body_end = totals_row.unwrap_or(rows.len());
        if body_start >= body_end {
            return Err(WordError::NoDataRows);
        }

        log::debug!(
            "Data table: header at row {header_row}, body {body_start}..{body_end}, blocks {:?}",
            blocks
                .iter()
                .map(|b| (b.standard.roman(), b.start, b.width, &b.columns))
                .collect::<Vec<_>>()
        );

        Ok(TableLayout {
            header_row,
            body: body_start..body_end,
            totals_row,
            blocks,
            serial_col,
            initials_col,
        })
    }
}

/// Locate the data table below `root`, put one row per teacher in it and fill the totals
///
/// # Errors
///
/// Fails when there is no data table or it has no prototype row
pub fn fill_data_table(root: &mut Element, data: &TableData) -> WordResult<TableLayout> {
    let path = find_data_table(root).ok_or(WordError::NoDataTable)?;
    let table = root.at_mut(&path).ok_or(WordError::NoDataTable)?;

    let layout = TableLayout::analyze(table)?;
    fill_table(table, &layout, data)?;

    Ok(layout)
}

/// # Errors
///
/// Fails with [`WordError::NoDataRows`] if `layout` does not match `table`
pub fn fill_table(table: &mut Element, layout: &TableLayout, data: &TableData) -> WordResult<()> {
    let positions = row_positions(table);
    let (Some(&first), Some(&last)) = (
        positions.get(layout.body.start),
        layout.body.end.checked_sub(1).and_then(|r| positions.get(r)),
    ) else {
        return Err(WordError::NoDataRows);
    };

    let mut prototype = match table.children.get(first) {
        Some(Node::Element(row)) => row.clone(),
        _ => return Err(WordError::NoDataRows),
    };
    clear_text(&mut prototype);
    remove_elements(&mut prototype, &["w:bookmarkStart", "w:bookmarkEnd"]);

    if let Some(Node::Element(totals)) = layout
        .totals_row
        .and_then(|r| positions.get(r))
        .and_then(|p| table.children.get_mut(*p))
    {
        for block in &layout.blocks {
            if let Some(values) = data.totals.get(&block.standard) {
                write_block(totals, block, values);
            }
        }
    }

    let rows = data
        .rows
        .iter()
        .enumerate()
        .map(|(i, teacher)| {
            let mut row = prototype.clone();
            if let Some(col) = layout.serial_col {
                set_cell_text(&mut row, col, &(i + 1).to_string());
            }
            if let Some(col) = layout.initials_col {
                set_cell_text(&mut row, col, &teacher.initials);
            }
            for block in &layout.blocks {
                if let Some(values) = teacher.values.get(&block.standard) {
                    write_block(&mut row, block, values);
                }
            }
            Node::Element(row)
        })
        .collect::<Vec<_>>();

    log::debug!(
        "Replacing {} body row(s) with {} teacher row(s)",
        layout.body.len(),
        rows.len()
    );
    table.children.splice(first..=last, rows);

    Ok(())
}

fn write_block(row: &mut Element, block: &Block, values: &FieldValues) {
    for (field, value) in values {
        match block.column(*field) {
            Some(col) => set_cell_text(row, col, value),
            None => log::warn!(
                "The {} block has no {} column",
                block.standard.roman(),
                field.label()
            ),
        }
    }
}

fn set_cell_text(row: &mut Element, col: usize, text: &str) {
    let Some(cell) = cells(row).into_iter().find(|c| c.col == col) else {
        log::debug!("No cell starts at grid column {col}, `{text}` is not written");
        return;
    };

    if let Some(Node::Element(tc)) = row.children.get_mut(cell.index) {
        write_cell(tc, text);
    }
}

/// Put `text` in the first paragraph of the cell, formatted like what was there before
fn write_cell(tc: &mut Element, text: &str) {
    let index = match tc
        .children
        .iter()
        .position(|n| matches!(n, Node::Element(e) if e.name == "w:p"))
    {
        Some(index) => index,
        None => {
            tc.children.push(Node::Element(Element::new("w:p")));
            tc.children.len() - 1
        }
    };
    let Some(Node::Element(paragraph)) = tc.children.get_mut(index) else {
        return;
    };

    let run_properties = paragraph
        .descendants("w:r")
        .first()
        .and_then(|r| r.child("w:rPr"))
        .cloned()
        .or_else(|| {
            paragraph
                .child("w:pPr")
                .and_then(|p| p.child("w:rPr"))
                .cloned()
                .map(|mut mark| {
                    mark.children.retain(|n| {
                        !matches!(n, Node::Element(e) if MARK_ONLY.contains(&e.name.as_str()))
                    });
                    mark
                })
        });

    paragraph.children.retain(|n| match n {
        Node::Element(e) => !matches!(
            e.name.as_str(),
            "w:r" | "w:hyperlink" | "w:smartTag" | "w:ins" | "w:fldSimple" | "w:sdt"
        ),
        _ => true,
    });

    if text.is_empty() {
        return;
    }

    let mut run = Element::new("w:r");
    if let Some(properties) = run_properties {
        run.children.push(Node::Element(properties));
    }
    run.children.push(Node::Element(
        Element::new("w:t")
            .with_attr("xml:space", "preserve")
            .with_text(text),
    ));
    paragraph.children.push(Node::Element(run));
}

fn clear_text(element: &mut Element) {
    element.visit_mut(&mut |e| {
        if e.name == "w:t" {
            e.set_text("");
        }
    });
}

fn remove_elements(element: &mut Element, names: &[&str]) {
    element
        .children
        .retain(|n| !matches!(n, Node::Element(e) if names.contains(&e.name.as_str())));
    for child in element.elements_mut() {
        remove_elements(child, names);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{package::fixtures::*, xml::XmlDocument};

    fn body(content: &str) -> XmlDocument {
        XmlDocument::parse(format!(r#"<w:body xmlns:w="{W_NS}">{content}</w:body>"#).as_bytes())
            .unwrap()
    }

    fn row_texts(table: &Element) -> Vec<Vec<String>> {
        table_rows(table)
            .iter()
            .map(|row| {
                row.elements()
                    .filter(|e| e.name == "w:tc")
                    .map(|tc| {
                        tc.descendants("w:t")
                            .iter()
                            .map(|t| t.own_text())
                            .collect::<String>()
                    })
                    .collect()
            })
            .collect()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    fn fields(values: &[(Field, &str)]) -> FieldValues {
        values.iter().map(|(f, v)| (*f, (*v).to_string())).collect()
    }

    fn all_fields(values: [&str; 3]) -> FieldValues {
        Field::ALL
            .into_iter()
            .zip(values)
            .map(|(f, v)| (f, v.to_string()))
            .collect()
    }

    #[test]
    fn layout_of_the_summary_table() {
        let doc = body(&data_table());
        let path = find_data_table(&doc.root).unwrap();
        let table = doc.root.at(&path).unwrap();

        let layout = TableLayout::analyze(table).unwrap();

        assert_eq!(layout.header_row, 0);
        assert_eq!(layout.body, 2..4);
        assert_eq!(layout.totals_row, Some(4));
        assert_eq!(layout.serial_col, Some(0));
        assert_eq!(layout.initials_col, Some(1));
        assert_eq!(
            layout
                .blocks
                .iter()
                .map(|b| (b.standard, b.start, b.width))
                .collect::<Vec<_>>(),
            vec![(Standard::Fyjc, 2, 3), (Standard::Syjc, 5, 3)]
        );
        assert_eq!(layout.blocks[1].column(Field::Alotted), Some(5));
        assert_eq!(layout.blocks[1].column(Field::EAdd), Some(7));
    }

    #[test]
    fn the_first_marked_table_is_the_data_table() {
        let doc = body(&format!(
            "{}{}{}",
            paragraph("Summary"),
            format!("<w:tbl>{}</w:tbl>", row(&["Prepared by", "XI and XII"])),
            data_table()
        ));

        assert_eq!(find_data_table(&doc.root), Some(vec![2]));
        assert_eq!(find_data_table(&body(&paragraph("FYJC")).root), None);
    }

    #[test]
    fn blocks_without_span_stop_at_the_next_block() {
        let table = format!(
            "<w:tbl>{}{}{}</w:tbl>",
            row(&["Initials", "XI", "", "XII", ""]),
            row(&["", "", "", "", ""]),
            row(&["Total", "", "", "", ""])
        );
        let doc = body(&table);

        let layout = TableLayout::analyze(doc.root.at(&[0]).unwrap()).unwrap();

        assert_eq!(layout.serial_col, None);
        assert_eq!(layout.initials_col, Some(0));
        assert_eq!(layout.body, 1..2);
        assert_eq!(
            layout.blocks.iter().map(|b| (b.start, b.width)).collect::<Vec<_>>(),
            vec![(1, 2), (3, 3)]
        );
        // Without field names the fields go in their usual order
        assert_eq!(
            layout.blocks[0].columns,
            [(Field::Alotted, 1), (Field::EAct, 2)].into()
        );
        assert_eq!(layout.blocks[1].column(Field::EAdd), Some(5));
    }

    #[test]
    fn sub_headers_place_the_fields() {
        let table = format!(
            "<w:tbl>{}{}{}</w:tbl>",
            row(&["Initials", "XI", "", ""]),
            row(&["", "E-Add", "ALOTTED", "E-Act"]),
            row(&["", "", "", ""])
        );
        let mut doc = body(&table);
        let data = TableData {
            rows: vec![TableRow {
                initials: "AB".to_string(),
                values: [(Standard::Fyjc, fields(&[(Field::Alotted, "4"), (Field::EAdd, "1")]))]
                    .into(),
            }],
            totals: BTreeMap::new(),
        };

        fill_data_table(&mut doc.root, &data).unwrap();

        assert_eq!(
            row_texts(doc.root.at(&[0]).unwrap())[2],
            strings(&["AB", "1", "4", ""])
        );
    }

    #[test]
    fn tables_without_rows() {
        let doc = body(&format!(
            "<w:tbl>{}{}</w:tbl>",
            row(&["Initials", "XI"]),
            row(&["TOTAL", ""])
        ));
        assert!(matches!(
            TableLayout::analyze(doc.root.at(&[0]).unwrap()),
            Err(WordError::NoDataRows)
        ));

        let mut doc = body(&paragraph("no table"));
        assert!(matches!(
            fill_data_table(&mut doc.root, &TableData::default()),
            Err(WordError::NoDataTable)
        ));
    }

    #[test]
    fn filling_clones_the_prototype() {
        let mut doc = body(&data_table());
        let data = TableData {
            rows: vec![
                TableRow {
                    initials: "AB".to_string(),
                    values: [(Standard::Fyjc, all_fields(["4", "3", "1"]))].into(),
                },
                TableRow {
                    initials: "CD".to_string(),
                    values: [
                        (Standard::Fyjc, all_fields(["6", "None", ""])),
                        (Standard::Syjc, all_fields(["2", "2", "2"])),
                    ]
                    .into(),
                },
                TableRow {
                    initials: "EF".to_string(),
                    values: [(Standard::Syjc, all_fields(["1", "1", "0"]))].into(),
                },
            ],
            totals: [
                (Standard::Fyjc, all_fields(["10", "3", "1"])),
                (Standard::Syjc, all_fields(["3", "3", "2"])),
            ]
            .into(),
        };

        fill_data_table(&mut doc.root, &data).unwrap();

        let table = doc.root.at(&[0]).unwrap();
        assert_eq!(
            row_texts(table),
            vec![
                strings(&["Sr. No.", "Initials", "FYJC (XI)", "SYJC (XII)"]),
                strings(&["", "", "ALOTTED", "E-Act", "E-Add", "ALOTTED", "E-Act", "E-Add"]),
                strings(&["1", "AB", "4", "3", "1", "", "", ""]),
                strings(&["2", "CD", "6", "None", "", "2", "2", "2"]),
                strings(&["3", "EF", "", "", "", "1", "1", "0"]),
                strings(&["", "TOTAL", "10", "3", "1", "3", "3", "2"]),
            ]
        );

        // Serial numbers keep the bold run and the centered paragraph of the prototype
        let serial = &table_rows(table)[4].descendants("w:p")[0];
        assert!(serial.child("w:pPr").and_then(|p| p.child("w:jc")).is_some());
        assert_eq!(serial.descendants("w:b").len(), 1);
    }

    #[test]
    fn missing_fields_leave_their_column_empty() {
        let mut doc = body(&data_table());
        let data = TableData {
            rows: vec![TableRow {
                initials: "AB".to_string(),
                values: [(Standard::Fyjc, fields(&[(Field::Alotted, "4"), (Field::EAdd, "1")]))]
                    .into(),
            }],
            totals: [(Standard::Fyjc, fields(&[(Field::Alotted, "4"), (Field::EAdd, "1")]))]
                .into(),
        };

        fill_data_table(&mut doc.root, &data).unwrap();

        let texts = row_texts(doc.root.at(&[0]).unwrap());
        assert_eq!(texts[2], strings(&["1", "AB", "4", "", "1", "", "", ""]));
        assert_eq!(texts[3], strings(&["", "TOTAL", "4", "", "1", "", "", ""]));
    }

    #[test]
    fn totals_row_after_empty_cells() {
        let doc = body(&format!(
            "<w:tbl>{}{}{}{}</w:tbl>",
            row(&["Sr. No.", "Initials", "XI"]),
            row(&["1", "Total hours", ""]),
            row(&["", "", "Grand Total"]),
            row(&["", "", ""])
        ));

        let layout = TableLayout::analyze(doc.root.at(&[0]).unwrap()).unwrap();

        // `1` comes first in the second row, so only the third one is the totals row
        assert_eq!(layout.totals_row, Some(2));
        assert_eq!(layout.body, 1..2);
    }

    #[test]
    fn markers_of_nested_tables_belong_to_them() {
        let doc = body(&format!(
            "<w:tbl><w:tr><w:tc>{}{}{}</w:tc></w:tr></w:tbl>",
            paragraph("Layout"),
            data_table(),
            paragraph("")
        ));

        // w:tbl, w:tr, w:tc, then the table after the first paragraph
        assert_eq!(find_data_table(&doc.root), Some(vec![0, 0, 0, 1]));
    }

    #[test]
    fn cells_follow_grid_spans() {
        let doc = body(&format!(
            r#"<w:tbl><w:tr><w:trPr><w:gridBefore w:val="1"/></w:trPr>{}{}</w:tr></w:tbl>"#,
            cell("a", 2),
            cell("b", 1)
        ));
        let row = table_rows(doc.root.at(&[0]).unwrap())[0];

        let found = cells(row)
            .iter()
            .map(|c| (c.col, c.span))
            .collect::<Vec<_>>();
        assert_eq!(found, vec![(1, 2), (3, 1)]);
    }
}
