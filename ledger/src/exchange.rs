//! Month views as standalone workbooks: exported for editing in a spreadsheet program and
//! imported back as cell edits.

use crate::{
    edit::CellEdit,
    field::{data_text, numeric, Field},
    view::MonthView,
    LedgerError, LedgerResult,
};
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook};
use std::{collections::HashMap, path::Path};
use strings::normalize_label;

const ROW_HEADER: &str = "Row";
const INITIAL_HEADER: &str = "Initial";
const MAX_SHEET_NAME: usize = 31;

/// Write `view` as a grid: a hidden column with the sheet row, the initials and one column per
/// field.
///
/// # Errors
///
/// Fails if the grid can not be written
pub fn export_view(view: &MonthView, path: &Path) -> LedgerResult<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let name = view
        .month
        .chars()
        .filter(|c| !"[]:*?/\\".contains(*c))
        .take(MAX_SHEET_NAME)
        .collect::<String>();
    if !name.trim().is_empty() {
        worksheet.set_name(name.trim())?;
    }

    let header = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x00EE_ECE1))
        .set_align(FormatAlign::Center);

    let headers = std::iter::once(ROW_HEADER).chain(view.headers());
    for (col, title) in headers.enumerate() {
        worksheet.write_string_with_format(0, col as u16, title, &header)?;
    }

    for (i, row) in view.rows.iter().enumerate() {
        let n_row = i as u32 + 1;
        worksheet.write_number(n_row, 0, f64::from(row.row + 1))?;
        worksheet.write_string(n_row, 1, &row.initials)?;

        for (j, value) in row.values.iter().enumerate() {
            let col = j as u16 + 2;
            if let Some(n) = numeric(value) {
                worksheet.write_number(n_row, col, n)?;
            } else if !value.is_empty() {
                worksheet.write_string(n_row, col, value)?;
            }
        }
    }

    worksheet
        .autofit()
        // The first row holds the headers, keep it in sight
        .set_freeze_panes(1, 0)?
        .set_row_height(0, 25)?
        .set_column_hidden(0)?;

    workbook.save(path)?;
    log::info!("Exported {} to {}", view.month, path.display());

    Ok(())
}

/// Edits for the cells of `view` that changed in the grid at `path`. Rows are matched by sheet
/// row and, for grids without the hidden row column, by initials.
///
/// # Errors
///
/// Fails if the grid can not be read or has no `Initial` column
pub fn import_view(path: &Path, view: &MonthView) -> LedgerResult<Vec<CellEdit>> {
    let bad_grid = |msg: String| LedgerError::BadGrid(path.to_path_buf(), msg);

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| LedgerError::OpenWorkbook(path.to_path_buf(), format!("{e:?}")))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| bad_grid("the workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| LedgerError::MissingSheet(path.to_path_buf(), format!("{sheet}: {e:?}")))?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .ok_or_else(|| bad_grid("the grid is empty".to_string()))?
        .iter()
        .map(|h| data_text(h).map(|h| normalize_label(&h)).unwrap_or_default())
        .collect::<Vec<_>>();

    let row_col = headers.iter().position(|h| h == &normalize_label(ROW_HEADER));
    let initial_col = headers
        .iter()
        .position(|h| h == &normalize_label(INITIAL_HEADER) || h == "INITIALS")
        .ok_or_else(|| bad_grid("missing the Initial column".to_string()))?;
    let field_cols = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| Field::from_header(h).map(|f| (f, i)))
        .collect::<HashMap<_, _>>();

    let mut edits = Vec::new();
    for grid_row in rows {
        let cell = |i: usize| grid_row.get(i).and_then(data_text);

        let sheet_row = row_col
            .and_then(|c| grid_row.get(c))
            .and_then(sheet_row_of);
        let initials = cell(initial_col).map(|s| normalize_label(&s));

        let Some(row) = view.rows.iter().find(|r| match (sheet_row, &initials) {
            (Some(sheet_row), _) => r.row == sheet_row,
            (None, Some(initials)) => &normalize_label(&r.initials) == initials,
            (None, None) => false,
        }) else {
            if let Some(initials) = initials.filter(|i| !i.is_empty()) {
                log::warn!("{initials} is not a teacher of {}, skipping", view.month);
            }
            continue;
        };

        for (field, col) in &view.fields {
            let Some(grid_col) = field_cols.get(field) else {
                continue;
            };
            let new = field.display(cell(*grid_col).as_deref());
            let old = view.value(row, *field).unwrap_or_default();

            if new != old {
                log::debug!("{} {field}: {old:?} -> {new:?}", row.initials);
                edits.push(CellEdit::new(row.row, *col, *field, &new));
            }
        }
    }

    Ok(edits)
}

/// 0-based sheet row written in the hidden column. Anything but a whole number from 1 on was
/// typed over and is not trusted.
fn sheet_row_of(data: &Data) -> Option<u32> {
    let number = match data {
        Data::Float(n) if n.fract() == 0.0 && *n >= 1.0 && *n <= f64::from(u32::MAX) => {
            *n as u32
        }
        Data::Int(n) => u32::try_from(*n).ok()?,
        _ => return None,
    };

    number.checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_row_numbers() {
        assert_eq!(sheet_row_of(&Data::Float(4.0)), Some(3));
        assert_eq!(sheet_row_of(&Data::Int(1)), Some(0));
        assert_eq!(sheet_row_of(&Data::Float(4.7)), None);
        assert_eq!(sheet_row_of(&Data::Float(-3.0)), None);
        assert_eq!(sheet_row_of(&Data::Float(0.0)), None);
        assert_eq!(sheet_row_of(&Data::Int(0)), None);
        assert_eq!(sheet_row_of(&Data::String("4".to_string())), None);
    }
}
