#![deny(clippy::all)]
#![deny(rust_2018_idioms, unsafe_code)]
#![deny(clippy::unwrap_used)]

//! Word documents made from a template.
//!
//! A template is a regular `.docx` with `{{ placeholders }}` and one data table whose header names
//! the standards. Pages are filled in memory, straight on the XML of the package, and merged into
//! one document with a section per page.

mod convert;
mod merge;
mod package;
mod placeholder;
mod report;
mod table;
mod xml;

pub use convert::{Converter, DEFAULT_PROGRAM};
pub use merge::merge;
pub use package::{DocxPackage, DOCUMENT};
pub use placeholder::{fill_placeholders, placeholder_names, Values};
pub use report::{Report, ReportBuilder, ReportInfo};
pub use table::{
    fill_data_table, find_data_table, Block, FieldValues, TableData, TableLayout, TableRow,
};
pub use xml::{Element, Node, XmlDocument};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WordError {
    #[error("{0} is not a Word document, it has no word/document.xml")]
    NotDocx(String),
    #[error("the package has no part `{0}`")]
    MissingPart(String),
    #[error("malformed XML: {0}")]
    MalformedXml(String),
    #[error("the template has no table with XI/XII markers")]
    NoDataTable,
    #[error("the data table has no row to use as a model after its headers")]
    NoDataRows,
    #[error("there are no pages to merge")]
    NothingToMerge,
    #[error("`{program}` could not convert the document: {message}")]
    ConverterFailed { program: String, message: String },
    #[error("failed to read XML with `{0}`")]
    Xml(#[from] quick_xml::Error),
    #[error("failed to read or write the package with `{0}`")]
    Zip(#[from] zip::result::ZipError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type WordResult<T> = std::result::Result<T, WordError>;
