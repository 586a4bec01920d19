//! Yearly copies of the master workbook, one per academic year and term.

use crate::{
    calendar::Term,
    edit::{find_sheet, open_book, save_book},
    LedgerError, LedgerResult,
};
use bstr::ByteSlice;
use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    sync::OnceLock,
};
use walkdir::WalkDir;

const COPY_PREFIX: &str = "iso_excel";
const EXTENSION: &str = ".xlsx";

/// Academic year written as `2024-2025`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YearRange {
    pub start: u16,
    pub end: u16,
}

impl YearRange {
    /// # Errors
    ///
    /// Fails with [`LedgerError::InvalidYear`] unless the text looks like `20XX-20XX`
    pub fn parse(text: &str) -> LedgerResult<YearRange> {
        static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            regex::Regex::new(r"^(20\d{2})-(20\d{2})$").expect("the pattern is valid")
        });

        let text = text.trim();
        let invalid = || LedgerError::InvalidYear(text.to_string());
        let captures = pattern.captures(text).ok_or_else(invalid)?;

        let start = captures[1].parse().map_err(|_| invalid())?;
        let end = captures[2].parse().map_err(|_| invalid())?;

        if end != start + 1 {
            log::warn!("The year range {text} does not span two consecutive years");
        }

        Ok(YearRange { start, end })
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for YearRange {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        YearRange::parse(s)
    }
}

/// What the file name of a copy says about it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyName {
    pub year: YearRange,
    pub term: Term,
}

impl CopyName {
    /// `iso_excel_2024-2025_term1.xlsx`
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{COPY_PREFIX}_{}_{}{EXTENSION}", self.year, self.term)
    }

    /// Read year and term back from a copy file name
    ///
    /// # Examples
    ///
    /// ```
    /// use ledger::{CopyName, Term};
    ///
    /// let name = CopyName::parse("iso_excel_2024-2025_term2.xlsx").unwrap();
    /// assert_eq!(name.term, Term::Term2);
    /// assert_eq!(name.year.to_string(), "2024-2025");
    /// assert!(CopyName::parse("notes.xlsx").is_none());
    /// ```
    #[must_use]
    pub fn parse(file_name: &str) -> Option<CopyName> {
        let stem = file_name.strip_suffix(EXTENSION).unwrap_or(file_name);
        let (rest, term) = stem.rsplit_once('_')?;
        let (_, year) = rest.rsplit_once('_')?;

        Some(CopyName {
            year: YearRange::parse(year).ok()?,
            term: term.parse().ok()?,
        })
    }

    #[must_use]
    pub fn from_path(path: &Path) -> Option<CopyName> {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(CopyName::parse)
    }
}

/// Copy the sheet of `term` from `master` into a new workbook inside `copies_dir`. Values,
/// styles, merged cells and row and column sizes travel with the sheet.
///
/// # Errors
///
/// Fails when the master has no sheet for the term, the copy already exists and `overwrite` is
/// not set, or on I/O problems
pub fn create_copy(
    master: &Path,
    copies_dir: &Path,
    year: YearRange,
    term: Term,
    overwrite: bool,
) -> LedgerResult<PathBuf> {
    std::fs::create_dir_all(copies_dir)?;

    let target = copies_dir.join(CopyName { year, term }.file_name());
    if target.exists() && !overwrite {
        return Err(LedgerError::CopyExists(target));
    }

    let book = open_book(master)?;
    let sheet = find_sheet(&book, Some(term.sheet_name())).ok_or_else(|| {
        LedgerError::MissingSheet(master.to_path_buf(), term.sheet_name().to_string())
    })?;

    let mut copy = umya_spreadsheet::new_file_empty_worksheet();
    let mut sheet = sheet.clone();
    sheet.set_name(term.sheet_name());
    copy.add_sheet(sheet)
        .map_err(|e| LedgerError::SaveWorkbook(target.clone(), e.to_string()))?;

    save_book(&copy, &target)?;
    log::info!("Created {} from sheet {term}", target.display());

    Ok(target)
}

/// Workbooks directly inside `copies_dir`, sorted by name. Lock files (`~$...`), hidden and system
/// files are skipped, a missing directory has no copies.
#[must_use]
pub fn list_copies(copies_dir: &Path) -> Vec<PathBuf> {
    if !copies_dir.is_dir() {
        log::debug!("{} does not exist yet", copies_dir.display());
        return Vec::new();
    }

    let mut copies = WalkDir::new(copies_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping an entry of {}: {e}", copies_dir.display());
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| is_copy_name(entry.file_name().as_encoded_bytes()))
        .map(walkdir::DirEntry::into_path)
        .collect::<Vec<_>>();

    copies.sort();
    copies
}

fn is_copy_name(name: &[u8]) -> bool {
    name.ends_with_str(EXTENSION)
        && !name.starts_with_str("~")
        && !name.starts_with_str("$")
        && !name.starts_with_str(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn years() {
        assert_eq!(
            YearRange::parse(" 2024-2025 ").ok(),
            Some(YearRange { start: 2024, end: 2025 })
        );
        assert!(YearRange::parse("24-25").is_err());
        assert!(YearRange::parse("2024/2025").is_err());
        assert!(YearRange::parse("1999-2000").is_err());
        assert!(YearRange::parse("2024-20255").is_err());
    }

    #[test]
    fn copy_names() {
        let name = CopyName {
            year: YearRange { start: 2024, end: 2025 },
            term: Term::Term1,
        };
        assert_eq!(name.file_name(), "iso_excel_2024-2025_term1.xlsx");
        assert_eq!(CopyName::parse(&name.file_name()), Some(name));
    }

    #[test]
    fn listing_filters_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "iso_excel_2024-2025_term1.xlsx",
            "~$iso_excel_2024-2025_term1.xlsx",
            ".hidden.xlsx",
            "$system.xlsx",
            "notes.txt",
            "a.xlsx",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("reports.xlsx")).unwrap();

        let names = list_copies(dir.path())
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["a.xlsx", "iso_excel_2024-2025_term1.xlsx"]);
    }

    #[test]
    fn missing_directory_has_no_copies() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_copies(&dir.path().join("excel_copies")).is_empty());
    }
}
