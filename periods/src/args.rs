use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(version, about = "Teacher period allocation workbooks and their executive summaries")]
pub struct Args {
    /// Master workbook the yearly copies are made from
    #[clap(long, global = true, env = "PERIODS_MASTER", default_value = "iso_excel.xlsx")]
    pub master: PathBuf,

    /// Directory holding the yearly copies
    #[clap(long, global = true, env = "PERIODS_COPIES", default_value = "excel_copies")]
    pub copies: PathBuf,

    /// Never open dialogs, paths that are not given are an error
    #[clap(long, global = true)]
    pub cli: bool,

    /// Print debug messages
    #[clap(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print warnings and errors
    #[clap(short, long, global = true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Copy the sheet of a term from the master into a new workbook for an academic year
    Copy {
        /// Academic year, like 2024-2025
        year: String,
        /// Term whose sheet is copied
        #[clap(short, long, default_value = "term1")]
        term: String,
        /// Replace the copy if it already exists
        #[clap(long)]
        force: bool,
        /// Open the copy in the spreadsheet program afterwards
        #[clap(long)]
        open: bool,
    },
    /// List the yearly copies
    Copies,
    /// Open a workbook in the program the system uses for it
    Open {
        #[clap(short, long, conflicts_with = "master_file")]
        file: Option<PathBuf>,
        /// Open the master workbook
        #[clap(long = "master-file")]
        master_file: bool,
    },
    /// List the month groups of a workbook
    Months {
        /// Workbook to read, a dialog asks for it when missing
        #[clap(short, long)]
        file: Option<PathBuf>,
    },
    /// Print the values of a month
    Show {
        #[clap(short, long)]
        file: Option<PathBuf>,
        /// Month to print, the first one of the sheet by default
        #[clap(short, long)]
        month: Option<String>,
    },
    /// Change the values of one teacher in a month
    Set {
        #[clap(short, long)]
        file: Option<PathBuf>,
        #[clap(short, long)]
        month: String,
        /// Initials of the teacher
        initials: String,
        /// Values as FIELD=VALUE, FIELD being ALOTTED, E-Act or E-Add
        #[clap(required = true)]
        values: Vec<String>,
    },
    /// Write a month to a workbook of its own to edit it in a spreadsheet program
    Export {
        #[clap(short, long)]
        file: Option<PathBuf>,
        #[clap(short, long)]
        month: Option<String>,
        /// Where to write the grid, next to the workbook by default
        #[clap(short, long)]
        out: Option<PathBuf>,
        /// Open the grid in the spreadsheet program afterwards
        #[clap(long)]
        open: bool,
    },
    /// Save the changes made to an exported grid
    Import {
        #[clap(short, long)]
        file: Option<PathBuf>,
        #[clap(short, long)]
        month: String,
        /// The exported grid
        grid: PathBuf,
    },
    /// Fill the Word template with every month of a term and merge the pages
    Report(ReportArgs),
}

#[derive(clap::Args, Debug)]
pub struct ReportArgs {
    #[clap(short, long)]
    pub file: Option<PathBuf>,
    /// Word template with placeholders and the XI/XII table
    #[clap(long)]
    pub template: Option<PathBuf>,
    #[clap(short, long, value_enum, default_value_t = StandardChoice::All)]
    pub standard: StandardChoice,
    /// Term of the report, read from the file name of the copy by default
    #[clap(short, long)]
    pub term: Option<String>,
    /// Academic year, read from the file name of the copy by default
    #[clap(short, long)]
    pub year: Option<String>,
    /// Only these months, in this order
    #[clap(long, value_delimiter = ',')]
    pub months: Vec<String>,
    /// Where to save the report
    #[clap(short, long)]
    pub out: Option<PathBuf>,
    /// Save every page on its own next to the report
    #[clap(long)]
    pub keep_pages: bool,
    /// Convert the report to PDF
    #[clap(long)]
    pub pdf: bool,
    /// Office program used for the conversion
    #[clap(long, default_value = wordgen::DEFAULT_PROGRAM)]
    pub converter: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardChoice {
    Xi,
    Xii,
    All,
}

impl StandardChoice {
    #[must_use]
    pub fn standards(self) -> Vec<ledger::Standard> {
        match self {
            StandardChoice::Xi => vec![ledger::Standard::Fyjc],
            StandardChoice::Xii => vec![ledger::Standard::Syjc],
            StandardChoice::All => ledger::Standard::ALL.to_vec(),
        }
    }

    /// Part of the default report name
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            StandardChoice::Xi => "xi",
            StandardChoice::Xii => "xii",
            StandardChoice::All => "all",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn arguments_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn report_arguments() {
        let args = Args::try_parse_from([
            "periods",
            "--cli",
            "report",
            "-f",
            "excel_copies/iso_excel_2024-2025_term1.xlsx",
            "--template",
            "template.docx",
            "--standard",
            "xii",
            "--months",
            "june,july",
        ])
        .unwrap();

        assert!(args.cli);
        let Command::Report(report) = args.command else {
            panic!("not a report");
        };
        assert_eq!(report.standard, StandardChoice::Xii);
        assert_eq!(report.months, vec!["june", "july"]);
        assert_eq!(report.converter, PathBuf::from("soffice"));
        assert!(!report.pdf);
    }

    #[test]
    fn open_takes_a_file_or_the_master() {
        let args = Args::try_parse_from(["periods", "open", "--master-file"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Open {
                file: None,
                master_file: true
            }
        ));

        assert!(
            Args::try_parse_from(["periods", "open", "-f", "a.xlsx", "--master-file"]).is_err()
        );

        let args = Args::try_parse_from(["periods", "copy", "2024-2025", "--open"]).unwrap();
        assert!(matches!(args.command, Command::Copy { open: true, .. }));
    }

    #[test]
    fn set_needs_values() {
        assert!(Args::try_parse_from(["periods", "set", "-m", "JUNE", "AB"]).is_err());

        let args =
            Args::try_parse_from(["periods", "set", "-m", "JUNE", "AB", "ALOTTED=4", "E-Add=2"])
                .unwrap();
        let Command::Set { values, .. } = args.command else {
            panic!("not a set");
        };
        assert_eq!(values, vec!["ALOTTED=4", "E-Add=2"]);
    }
}
