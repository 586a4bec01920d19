use crate::{
    field::{CellValue, Field},
    LedgerError, LedgerResult,
};
use itertools::Itertools;
use std::path::Path;
use strings::normalize_label;
use umya_spreadsheet::{reader, writer, Spreadsheet, Worksheet};

/// New value for one cell, positions are 0-based
#[derive(Debug, Clone, PartialEq)]
pub struct CellEdit {
    pub row: u32,
    pub col: u32,
    pub field: Field,
    pub value: CellValue,
}

impl CellEdit {
    /// Edit for what the user typed, normalized the way `field` stores it
    #[must_use]
    pub fn new(row: u32, col: u32, field: Field, input: &str) -> CellEdit {
        CellEdit {
            row,
            col,
            field,
            value: field.store(input),
        }
    }
}

pub(crate) fn open_book(path: &Path) -> LedgerResult<Spreadsheet> {
    reader::xlsx::read(path)
        .map_err(|e| LedgerError::OpenWorkbook(path.to_path_buf(), format!("{e:?}")))
}

pub(crate) fn save_book(book: &Spreadsheet, path: &Path) -> LedgerResult<()> {
    writer::xlsx::write(book, path)
        .map_err(|e| LedgerError::SaveWorkbook(path.to_path_buf(), format!("{e:?}")))
}

/// Sheet called `name` ignoring case and spacing, or the first sheet
pub(crate) fn find_sheet<'a>(book: &'a Spreadsheet, name: Option<&str>) -> Option<&'a Worksheet> {
    let sheets = book.get_sheet_collection();
    match name {
        Some(name) => {
            let name = normalize_label(name);
            sheets.iter().find(|s| normalize_label(s.get_name()) == name)
        }
        None => sheets.first(),
    }
}

fn find_sheet_mut<'a>(book: &'a mut Spreadsheet, name: Option<&str>) -> Option<&'a mut Worksheet> {
    let sheets = book.get_sheet_collection_mut();
    match name {
        Some(name) => {
            let name = normalize_label(name);
            sheets
                .iter_mut()
                .find(|s| normalize_label(s.get_name()) == name)
        }
        None => sheets.first_mut(),
    }
}

/// Apply `edits` to the workbook at `path` and save it once. Formulas, styles and every other
/// cell are kept.
///
/// # Errors
///
/// Fails when the workbook can not be read or written or the sheet does not exist
pub fn write_edits(path: &Path, sheet: Option<&str>, edits: &[CellEdit]) -> LedgerResult<()> {
    if edits.is_empty() {
        log::debug!("Nothing to save in {}", path.display());
        return Ok(());
    }

    let mut book = open_book(path)?;
    let worksheet = find_sheet_mut(&mut book, sheet).ok_or_else(|| {
        LedgerError::MissingSheet(path.to_path_buf(), sheet.unwrap_or_default().to_string())
    })?;

    for edit in edits {
        let cell = worksheet.get_cell_mut((edit.col + 1, edit.row + 1));
        match &edit.value {
            CellValue::Blank => {
                cell.set_cell_value(umya_spreadsheet::CellValue::default());
            }
            CellValue::Number(n) => {
                cell.set_value_number(*n);
            }
            CellValue::Text(text) => {
                cell.set_value_string(text.as_str());
            }
        }
    }

    log::info!(
        "Saving {} cell(s) to {}: {}",
        edits.len(),
        path.display(),
        edits
            .iter()
            .map(|e| format!("{}{}", column_name(e.col), e.row + 1))
            .join(", ")
    );

    save_book(&book, path)
}

/// Spreadsheet column letters for a 0-based column
#[must_use]
pub fn column_name(col: u32) -> String {
    let mut n = col + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    name.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
    }
}
