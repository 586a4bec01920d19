#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(rust_2018_idioms, unsafe_code)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![deny(clippy::unwrap_used)]

use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use std::path::{Path, PathBuf};

pub const EXCEL: (&str, &[&str]) = ("Excel", &["xlsx"]);
pub const WORD: (&str, &[&str]) = ("Word", &["docx"]);

/// Ask for a file to open, starting at `start` when given. Returns None if the user confirmed
/// they wanted to cancel the selection.
///
/// After the user asking for the operation to be cancelled the program may be terminated without further
/// confirmation by the caller
#[must_use]
pub fn ask_open_file(
    title: &str,
    start: Option<&Path>,
    filters: &[(&str, &[&str])],
) -> Option<PathBuf> {
    loop {
        let res = append_filters(filters, FileDialog::new())
            .set_title(title)
            .set_directory(start_directory(start))
            .pick_file();

        let Some(file) = res else {
            if let MessageDialogResult::Yes = confirm_cancel() {
                break None;
            }

            continue;
        };

        break Some(file);
    }
}

/// Yes/No question
#[must_use]
pub fn confirm(title: &str, description: &str) -> bool {
    let res = MessageDialog::new()
        .set_title(title)
        .set_description(description)
        .set_level(MessageLevel::Warning)
        .set_buttons(MessageButtons::YesNo)
        .show();

    matches!(res, MessageDialogResult::Yes)
}

/// Show an informative message box
pub fn info(title: &str, description: &str) {
    let _ = MessageDialog::new()
        .set_title(title)
        .set_description(description)
        .set_level(MessageLevel::Info)
        .show();
}

/// Show an error message box
pub fn error(title: &str, description: &str) {
    let _ = MessageDialog::new()
        .set_title(title)
        .set_description(description)
        .set_level(MessageLevel::Error)
        .show();
}

/// Append a collection of filters with (name, extensions) to a `FileDialog`
fn append_filters(filters: &[(&str, &[&str])], mut dialog: FileDialog) -> FileDialog {
    for (name, ext) in filters.iter().copied() {
        dialog = dialog.add_filter(name, ext);
    }

    dialog
}

fn start_directory(start: Option<&Path>) -> PathBuf {
    start
        .filter(|p| p.is_dir())
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())
        .or_else(dirs::document_dir)
        .unwrap_or_default()
}

fn confirm_cancel() -> MessageDialogResult {
    MessageDialog::new()
        .set_title("Cancel and quit")
        .set_description("Do you really want to cancel and close the program?")
        .set_buttons(MessageButtons::YesNo)
        .show()
}
