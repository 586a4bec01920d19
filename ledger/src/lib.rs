#![deny(clippy::all)]
#![deny(rust_2018_idioms, unsafe_code)]
#![deny(clippy::unwrap_used)]

//! Teacher period allocation workbooks.
//!
//! A workbook keeps one sheet per term; every month owns a group of columns (`ALOTTED`, `E-Act`,
//! `E-Add`...) and every teacher a row. Values are read from the cached results with `calamine`
//! and written back with `umya-spreadsheet`, which keeps formulas and styles in place.

mod calendar;
mod copies;
mod edit;
mod exchange;
mod field;
mod layout;
mod view;

pub use calendar::{Month, Standard, Term};
pub use copies::{create_copy, list_copies, CopyName, YearRange};
pub use edit::{column_name, write_edits, CellEdit};
pub use exchange::{export_view, import_view};
pub use field::{format_number, numeric, CellValue, Field};
pub use layout::{Layout, MonthGroup, TeacherRow};
pub use view::{MonthView, ViewRow};

use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("failed to open workbook at `{0:?}` with `{1}`")]
    OpenWorkbook(PathBuf, String),
    #[error("failed to save workbook at `{0:?}` with `{1}`")]
    SaveWorkbook(PathBuf, String),
    #[error("workbook `{0:?}` has no sheet `{1}`")]
    MissingSheet(PathBuf, String),
    #[error("sheet `{0}` has no month headers in its first row")]
    NoMonths(String),
    #[error("month `{0}` not found")]
    UnknownMonth(String),
    #[error("teacher `{0}` not found")]
    UnknownTeacher(String),
    #[error("month `{month}` has no `{field}` column")]
    UnknownField { month: String, field: Field },
    #[error("`{0}` is not a year range like 2024-2025")]
    InvalidYear(String),
    #[error("`{0}` is not a term, use term1 or term2")]
    InvalidTerm(String),
    #[error("`{0}` is not an editable field, use ALOTTED, E-Act or E-Add")]
    InvalidField(String),
    #[error("`{0}` is not a standard, use XI/FYJC or XII/SYJC")]
    InvalidStandard(String),
    #[error("the copy `{0:?}` already exists")]
    CopyExists(PathBuf),
    #[error("grid `{0:?}` can not be imported: {1}")]
    BadGrid(PathBuf, String),
    #[error("failed to write grid: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// One sheet of an allocation workbook, loaded with its cached values
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    sheet: String,
    range: Range<Data>,
    layout: Layout,
}

impl Ledger {
    /// Load `sheet` (the first sheet when `None`) of the workbook at `path`
    ///
    /// # Errors
    ///
    /// Fails if the workbook or sheet can not be opened or the sheet has no month headers
    pub fn open(path: impl AsRef<Path>, sheet: Option<&str>) -> LedgerResult<Ledger> {
        let path = path.as_ref();
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| LedgerError::OpenWorkbook(path.to_path_buf(), format!("{e:?}")))?;

        let names = workbook.sheet_names();
        let sheet = match sheet {
            Some(wanted) => {
                let wanted_label = strings::normalize_label(wanted);
                names
                    .iter()
                    .find(|n| strings::normalize_label(n) == wanted_label)
                    .cloned()
                    .ok_or_else(|| {
                        LedgerError::MissingSheet(path.to_path_buf(), wanted.to_string())
                    })?
            }
            None => names
                .first()
                .cloned()
                .ok_or_else(|| LedgerError::MissingSheet(path.to_path_buf(), String::new()))?,
        };

        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| LedgerError::MissingSheet(path.to_path_buf(), format!("{sheet}: {e:?}")))?;
        let layout = Layout::from_range(&sheet, &range)?;

        log::debug!(
            "{}:{sheet} has {} month group(s) and {} teacher(s)",
            path.display(),
            layout.groups.len(),
            layout.teachers.len()
        );

        Ok(Ledger {
            path: path.to_path_buf(),
            sheet,
            range,
            layout,
        })
    }

    /// Load the workbook again, after it has been saved
    ///
    /// # Errors
    ///
    /// Same as [`Ledger::open`]
    pub fn reload(&mut self) -> LedgerResult<()> {
        *self = Ledger::open(&self.path, Some(&self.sheet))?;
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn months(&self) -> impl Iterator<Item = &str> {
        self.layout.months()
    }

    /// # Errors
    ///
    /// Fails with [`LedgerError::UnknownMonth`] if no group is called `month`
    pub fn group(&self, month: &str) -> LedgerResult<&MonthGroup> {
        self.layout
            .group(month)
            .ok_or_else(|| LedgerError::UnknownMonth(month.to_string()))
    }

    /// Editable values of `month`
    ///
    /// # Errors
    ///
    /// Fails with [`LedgerError::UnknownMonth`] if no group is called `month`
    pub fn month_view(&self, month: &str) -> LedgerResult<MonthView> {
        let group = self.group(month)?;
        Ok(MonthView::read(&self.layout, &self.range, group))
    }

    /// Edit of one teacher's `field` in `month`
    ///
    /// # Errors
    ///
    /// Fails if the month, the teacher or the field inside the month do not exist
    pub fn edit(
        &self,
        month: &str,
        initials: &str,
        field: Field,
        value: &str,
    ) -> LedgerResult<CellEdit> {
        let group = self.group(month)?;
        let teacher = self
            .layout
            .teacher(initials)
            .ok_or_else(|| LedgerError::UnknownTeacher(initials.to_string()))?;
        let (_, col) = self
            .layout
            .fields(group)
            .into_iter()
            .find(|(f, _)| *f == field)
            .ok_or_else(|| LedgerError::UnknownField {
                month: group.label.clone(),
                field,
            })?;

        Ok(CellEdit::new(teacher.row, col, field, value))
    }

    /// Write `edits` to the workbook this sheet was loaded from
    ///
    /// # Errors
    ///
    /// Fails if the workbook can not be saved
    pub fn save(&self, edits: &[CellEdit]) -> LedgerResult<()> {
        write_edits(&self.path, Some(&self.sheet), edits)
    }

    /// Edits writing every value of `view` back, the equivalent of saving the whole grid
    #[must_use]
    pub fn edits_for_view(view: &MonthView) -> Vec<CellEdit> {
        view.rows
            .iter()
            .flat_map(|row| {
                view.fields
                    .iter()
                    .zip(&row.values)
                    .map(|((field, col), value)| CellEdit::new(row.row, *col, *field, value))
            })
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn master() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("iso_excel.xlsx");
        fixtures::write_master(&path);
        (dir, path)
    }

    #[test]
    fn month_view_normalizes_values() {
        let (_dir, path) = master();
        let ledger = Ledger::open(&path, Some("term1")).unwrap();

        assert_eq!(ledger.months().collect::<Vec<_>>(), vec!["JUNE", "JULY", "TOTAL"]);

        let june = ledger.month_view("june").unwrap();
        assert_eq!(june.headers(), vec!["Initial", "ALOTTED", "E-Act", "E-Add"]);

        let rows = june
            .rows
            .iter()
            .map(|r| (r.initials.as_str(), r.values.clone()))
            .collect::<Vec<_>>();
        assert_eq!(
            rows,
            vec![
                ("AB", vec!["4".to_string(), "3".into(), "1".into()]),
                ("CD", vec!["6".to_string(), String::new(), String::new()]),
                ("EF", vec!["2".to_string(), "2".into(), "2".into()]),
            ]
        );

        assert_eq!(june.total(Field::Alotted, None), "12");
        assert_eq!(june.total(Field::Alotted, Some(Standard::Fyjc)), "10");
        assert_eq!(june.total(Field::EAdd, Some(Standard::Syjc)), "2");
    }

    #[test]
    fn unknown_month() {
        let (_dir, path) = master();
        let ledger = Ledger::open(&path, Some("term1")).unwrap();

        assert!(matches!(
            ledger.month_view("MARCH"),
            Err(LedgerError::UnknownMonth(_))
        ));
    }

    #[test]
    fn edits_are_saved_and_read_back() {
        let (_dir, path) = master();
        let mut ledger = Ledger::open(&path, Some("term1")).unwrap();

        let edits = vec![
            ledger.edit("JUNE", "cd", Field::EAct, "5").unwrap(),
            ledger.edit("JUNE", "CD", Field::EAdd, "'3'").unwrap(),
            ledger.edit("JUNE", "AB", Field::Alotted, "").unwrap(),
        ];
        assert_eq!(edits[1].value, CellValue::Text("+3".into()));

        ledger.save(&edits).unwrap();
        ledger.reload().unwrap();

        let june = ledger.month_view("JUNE").unwrap();
        assert_eq!(june.rows[1].values, vec!["6", "5", "3"]);
        assert_eq!(june.rows[0].values[0], "");

        // the other sheet survives the save
        let term2 = Ledger::open(&path, Some("term2")).unwrap();
        assert_eq!(term2.months().collect::<Vec<_>>(), vec!["NOVEMBER"]);
    }

    #[test]
    fn edit_errors() {
        let (_dir, path) = master();
        let ledger = Ledger::open(&path, Some("term1")).unwrap();

        assert!(matches!(
            ledger.edit("JUNE", "ZZ", Field::EAct, "1"),
            Err(LedgerError::UnknownTeacher(_))
        ));
        assert!(matches!(
            ledger.edit("TOTAL", "AB", Field::EAdd, "1"),
            Err(LedgerError::UnknownField { .. })
        ));
    }

    #[test]
    fn yearly_copy_keeps_only_the_term_sheet() {
        let (dir, path) = master();
        let copies = dir.path().join("excel_copies");
        let year = YearRange::parse("2024-2025").unwrap();

        let copy = create_copy(&path, &copies, year, Term::Term1, false).unwrap();
        assert_eq!(
            copy.file_name().unwrap().to_string_lossy(),
            "iso_excel_2024-2025_term1.xlsx"
        );
        assert_eq!(list_copies(&copies), vec![copy.clone()]);

        let ledger = Ledger::open(&copy, None).unwrap();
        assert_eq!(ledger.sheet(), "term1");
        assert_eq!(ledger.layout().teachers.len(), 3);

        assert!(matches!(
            create_copy(&path, &copies, year, Term::Term1, false),
            Err(LedgerError::CopyExists(_))
        ));
        assert!(create_copy(&path, &copies, year, Term::Term1, true).is_ok());
    }

    #[test]
    fn copy_needs_the_term_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("iso_excel.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        workbook.add_worksheet().set_name("Sheet1").unwrap();
        workbook.save(&path).unwrap();

        let year = YearRange::parse("2024-2025").unwrap();
        assert!(matches!(
            create_copy(&path, dir.path(), year, Term::Term2, false),
            Err(LedgerError::MissingSheet(..))
        ));
    }

    #[test]
    fn grid_round_trip_only_reports_changes() {
        let (dir, path) = master();
        let ledger = Ledger::open(&path, Some("term1")).unwrap();
        let view = ledger.month_view("JUNE").unwrap();

        let grid = dir.path().join("june.xlsx");
        export_view(&view, &grid).unwrap();
        assert!(import_view(&grid, &view).unwrap().is_empty());

        let mut edited = view.clone();
        edited.rows[2].values[1] = "9".to_string();
        edited.rows[0].values[2] = String::new();
        export_view(&edited, &grid).unwrap();

        let edits = import_view(&grid, &view).unwrap();
        assert_eq!(
            edits,
            vec![
                CellEdit::new(3, 4, Field::EAdd, ""),
                CellEdit::new(6, 3, Field::EAct, "9"),
            ]
        );
    }
}
