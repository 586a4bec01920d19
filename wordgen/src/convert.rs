//! PDF conversion through an office suite installed on the machine.

use crate::{WordError, WordResult};
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Command,
};

pub const DEFAULT_PROGRAM: &str = "soffice";

/// Headless office program that understands `--convert-to`, LibreOffice and its forks do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converter {
    program: PathBuf,
}

impl Default for Converter {
    fn default() -> Self {
        Converter::new(DEFAULT_PROGRAM)
    }
}

impl Converter {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Converter {
        Converter {
            program: program.into(),
        }
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Where the PDF of `input` ends up
    #[must_use]
    pub fn output_for(input: &Path) -> PathBuf {
        input.with_extension("pdf")
    }

    fn args(input: &Path) -> Vec<OsString> {
        let out_dir = input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        vec![
            "--headless".into(),
            "--convert-to".into(),
            "pdf".into(),
            "--outdir".into(),
            out_dir.into(),
            input.into(),
        ]
    }

    /// Convert `input` to a PDF next to it
    ///
    /// # Errors
    ///
    /// Fails when the program can not be started or exits with an error
    pub fn to_pdf(&self, input: &Path) -> WordResult<PathBuf> {
        let failed = |message: String| WordError::ConverterFailed {
            program: self.program.display().to_string(),
            message,
        };

        log::info!("Converting {} with {}", input.display(), self.program.display());
        let output = Command::new(&self.program)
            .args(Converter::args(input))
            .output()
            .map_err(|e| failed(e.to_string()))?;

        if !output.status.success() {
            return Err(failed(format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let pdf = Converter::output_for(input);
        if !pdf.exists() {
            return Err(failed(format!("{} was not written", pdf.display())));
        }

        Ok(pdf)
    }
}
