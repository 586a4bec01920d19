use crate::{AppError, AppResult};
use dialogs::{ask_open_file, EXCEL};
use std::path::{Path, PathBuf};

const APP: &str = "Period allocations";

/// Paths and the way to ask the user for what is missing
#[derive(Debug, Clone)]
pub struct Context {
    pub master: PathBuf,
    pub copies: PathBuf,
    pub interactive: bool,
}

impl Context {
    /// `given` or, without `--cli`, what the user picks in a dialog opened at `start`. `None`
    /// means the user cancelled.
    ///
    /// # Errors
    ///
    /// Fails when nothing was given and dialogs are disabled
    pub fn pick(
        &self,
        given: Option<PathBuf>,
        what: &str,
        start: &Path,
        filters: &[(&str, &[&str])],
    ) -> AppResult<Option<PathBuf>> {
        if let Some(path) = given {
            return Ok(Some(path));
        }

        if !self.interactive {
            return Err(AppError::Usage(format!(
                "missing {what}, dialogs are disabled by --cli"
            )));
        }

        Ok(ask_open_file(&format!("Select the {what}"), Some(start), filters))
    }

    /// Workbook to work on. A bare file name is looked for in the copies directory too.
    ///
    /// # Errors
    ///
    /// Same as [`Context::pick`]
    pub fn workbook(&self, given: Option<PathBuf>) -> AppResult<Option<PathBuf>> {
        let given = given.map(|path| {
            let in_copies = self.copies.join(&path);
            if !path.exists() && path.parent() == Some(Path::new("")) && in_copies.exists() {
                in_copies
            } else {
                path
            }
        });

        self.pick(given, "workbook", &self.copies, &[EXCEL])
    }

    pub fn error(&self, message: &str) {
        log::error!("{message}");
        if self.interactive {
            dialogs::error(APP, message);
        }
    }

    /// Tell the user how a command ended
    pub fn notify(&self, message: &str) {
        log::info!("{message}");
        if self.interactive {
            dialogs::info(APP, message);
        }
    }

    /// Whether to go on when the answer needs the user. Without dialogs the answer is no.
    #[must_use]
    pub fn confirm(&self, question: &str) -> bool {
        self.interactive && dialogs::confirm(APP, question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(copies: &Path) -> Context {
        Context {
            master: PathBuf::from("iso_excel.xlsx"),
            copies: copies.to_path_buf(),
            interactive: false,
        }
    }

    #[test]
    fn bare_names_are_found_in_the_copies() {
        let dir = tempfile::tempdir().unwrap();
        let copy = dir.path().join("iso_excel_2024-2025_term1.xlsx");
        std::fs::write(&copy, b"").unwrap();

        let ctx = context(dir.path());
        let found = ctx
            .workbook(Some(PathBuf::from("iso_excel_2024-2025_term1.xlsx")))
            .unwrap();
        assert_eq!(found, Some(copy));

        let other = PathBuf::from("elsewhere/iso_excel_2024-2025_term1.xlsx");
        assert_eq!(ctx.workbook(Some(other.clone())).unwrap(), Some(other));
    }

    #[test]
    fn missing_paths_without_dialogs() {
        let ctx = context(Path::new("excel_copies"));
        assert!(matches!(ctx.workbook(None), Err(AppError::Usage(_))));
        assert!(!ctx.confirm("Overwrite?"));
    }
}
