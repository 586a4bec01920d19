use crate::{
    args::{Command, ReportArgs, StandardChoice},
    context::Context,
    AppError, AppResult,
};
use dialogs::WORD;
use itertools::Itertools;
use ledger::{
    create_copy, export_view, import_view, list_copies, CopyName, Field, Ledger, LedgerError,
    Month, MonthView, Term, YearRange,
};
use std::{
    iter::once,
    path::{Path, PathBuf},
};
use wordgen::{Converter, DocxPackage, ReportBuilder, ReportInfo};

pub fn run(ctx: &Context, command: Command) -> AppResult<()> {
    match command {
        Command::Copy {
            year,
            term,
            force,
            open,
        } => copy(ctx, &year, &term, force, open),
        Command::Copies => {
            copies(ctx);
            Ok(())
        }
        Command::Open { file, master_file } => {
            let path = if master_file {
                Some(ctx.master.clone())
            } else {
                ctx.workbook(file)?
            };
            match path {
                Some(path) => open_file(&path),
                None => Ok(()),
            }
        }
        Command::Months { file } => months(ctx, file),
        Command::Show { file, month } => show(ctx, file, month.as_deref()),
        Command::Set {
            file,
            month,
            initials,
            values,
        } => set(ctx, file, &month, &initials, &values),
        Command::Export {
            file,
            month,
            out,
            open,
        } => export(ctx, file, month.as_deref(), out, open),
        Command::Import { file, month, grid } => import(ctx, file, &month, &grid),
        Command::Report(args) => report(ctx, args),
    }
}

/// Hand `path` to the program the system opens it with
fn open_file(path: &Path) -> AppResult<()> {
    if !path.exists() {
        return Err(AppError::Usage(format!("{} does not exist", path.display())));
    }

    log::info!("Opening {}", path.display());
    opener::open(path).map_err(|e| AppError::Open(path.to_path_buf(), e.to_string()))
}

fn copy(ctx: &Context, year: &str, term: &str, force: bool, open: bool) -> AppResult<()> {
    let year = YearRange::parse(year)?;
    let term = term.parse::<Term>()?;

    let path = match create_copy(&ctx.master, &ctx.copies, year, term, force) {
        Err(LedgerError::CopyExists(path))
            if ctx.confirm(&format!("{} already exists. Replace it?", path.display())) =>
        {
            create_copy(&ctx.master, &ctx.copies, year, term, true)?
        }
        result => result?,
    };

    println!("{}", path.display());
    if open {
        return open_file(&path);
    }

    ctx.notify(&format!("The copy was saved as {}", path.display()));
    Ok(())
}

fn copies(ctx: &Context) {
    let copies = list_copies(&ctx.copies);
    if copies.is_empty() {
        println!("No copies found in {}", ctx.copies.display());
        return;
    }

    for path in copies {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match CopyName::from_path(&path) {
            Some(copy) => println!("{name}\t{}\t{}", copy.year, copy.term.title()),
            None => println!("{name}"),
        }
    }
}

/// Load a workbook. Copies are opened on the sheet of their term, anything else on its first
/// sheet.
fn open_ledger(path: &Path, sheet: Option<&str>) -> AppResult<Ledger> {
    let sheet = sheet.or_else(|| CopyName::from_path(path).map(|c| c.term.sheet_name()));

    match Ledger::open(path, sheet) {
        Err(LedgerError::MissingSheet(_, wanted)) if sheet.is_some() => {
            log::warn!("{} has no sheet {wanted}, using its first sheet", path.display());
            Ok(Ledger::open(path, None)?)
        }
        result => Ok(result?),
    }
}

/// Label of the group `month` names, or of the first month of the sheet
fn month_label(ledger: &Ledger, month: Option<&str>) -> AppResult<String> {
    let groups = &ledger.layout().groups;

    let group = match month {
        Some(month) => ledger.group(month).ok().or_else(|| {
            let wanted = Month::parse(month)?;
            groups
                .iter()
                .filter(|g| !g.is_total())
                .find(|g| Month::parse(&g.label) == Some(wanted))
        }),
        None => groups.iter().find(|g| !g.is_total()),
    };

    match (group, month) {
        (Some(group), _) => Ok(group.label.clone()),
        (None, Some(month)) => Err(LedgerError::UnknownMonth(month.to_string()).into()),
        (None, None) => Err(LedgerError::NoMonths(ledger.sheet().to_string()).into()),
    }
}

fn months(ctx: &Context, file: Option<PathBuf>) -> AppResult<()> {
    let Some(path) = ctx.workbook(file)? else {
        return Ok(());
    };
    let ledger = open_ledger(&path, None)?;

    for group in &ledger.layout().groups {
        let fields = ledger
            .layout()
            .fields(group)
            .iter()
            .map(|(f, _)| f.label())
            .join(", ");
        let kind = if group.is_total() { " (totals)" } else { "" };
        println!("{}{kind}\t{fields}", group.label);
    }

    Ok(())
}

fn show(ctx: &Context, file: Option<PathBuf>, month: Option<&str>) -> AppResult<()> {
    let Some(path) = ctx.workbook(file)? else {
        return Ok(());
    };
    let ledger = open_ledger(&path, None)?;
    let view = ledger.month_view(&month_label(&ledger, month)?)?;

    if let Some(message) = no_data(&view) {
        println!("{message}");
        ctx.notify(&message);
        return Ok(());
    }

    println!("{} ({} teachers)", view.month, view.rows.len());
    println!("{}", render_view(&view));

    Ok(())
}

/// What to tell the user about a month without fields or teachers
fn no_data(view: &MonthView) -> Option<String> {
    view.is_empty().then(|| format!("No data to show for {}", view.month))
}

/// The view as aligned columns, with the totals at the bottom
fn render_view(view: &MonthView) -> String {
    let mut lines = vec![view
        .headers()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>()];
    lines.extend(view.rows.iter().map(|row| {
        once(row.initials.clone())
            .chain(row.values.iter().cloned())
            .collect::<Vec<_>>()
    }));
    lines.push(
        once("TOTAL".to_string())
            .chain(view.fields.iter().map(|(f, _)| view.total(*f, None)))
            .collect(),
    );

    let widths = (0..=view.fields.len())
        .map(|col| {
            lines
                .iter()
                .map(|line| line.get(col).map_or(0, |s| s.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect::<Vec<_>>();

    lines
        .iter()
        .map(|line| {
            line.iter()
                .zip(&widths)
                .map(|(text, width)| format!("{text:<width$}"))
                .join("  ")
                .trim_end()
                .to_string()
        })
        .join("\n")
}

/// `E-Add=2` into the field and the value
fn parse_assignment(assignment: &str) -> AppResult<(Field, &str)> {
    let (field, value) = assignment.split_once('=').ok_or_else(|| {
        AppError::Usage(format!("`{assignment}` is not written as FIELD=VALUE"))
    })?;

    Ok((field.parse()?, value))
}

fn set(
    ctx: &Context,
    file: Option<PathBuf>,
    month: &str,
    initials: &str,
    values: &[String],
) -> AppResult<()> {
    let Some(path) = ctx.workbook(file)? else {
        return Ok(());
    };
    let ledger = open_ledger(&path, None)?;
    let label = month_label(&ledger, Some(month))?;

    let edits = values
        .iter()
        .map(|assignment| {
            let (field, value) = parse_assignment(assignment)?;
            Ok(ledger.edit(&label, initials, field, value)?)
        })
        .collect::<AppResult<Vec<_>>>()?;

    ledger.save(&edits)?;
    println!("Saved {} value(s) of {initials} in {label}", edits.len());

    Ok(())
}

/// `iso_excel_2024-2025_term1_june.xlsx` next to the workbook
fn default_grid_path(workbook: &Path, month: &str) -> PathBuf {
    let stem = workbook
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let month = month
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .to_lowercase();

    workbook.with_file_name(format!("{stem}_{month}.xlsx"))
}

fn export(
    ctx: &Context,
    file: Option<PathBuf>,
    month: Option<&str>,
    out: Option<PathBuf>,
    open: bool,
) -> AppResult<()> {
    let Some(path) = ctx.workbook(file)? else {
        return Ok(());
    };
    let ledger = open_ledger(&path, None)?;
    let label = month_label(&ledger, month)?;
    let view = ledger.month_view(&label)?;

    if let Some(message) = no_data(&view) {
        println!("{message}");
        ctx.notify(&message);
        return Ok(());
    }

    let out = out.unwrap_or_else(|| default_grid_path(&path, &label));
    export_view(&view, &out)?;
    println!("{}", out.display());

    if open {
        open_file(&out)?;
    }

    Ok(())
}

fn import(ctx: &Context, file: Option<PathBuf>, month: &str, grid: &Path) -> AppResult<()> {
    let Some(path) = ctx.workbook(file)? else {
        return Ok(());
    };
    let ledger = open_ledger(&path, None)?;
    let label = month_label(&ledger, Some(month))?;
    let view = ledger.month_view(&label)?;

    let edits = import_view(grid, &view)?;
    if edits.is_empty() {
        println!("No changes for {label}");
        return Ok(());
    }

    ledger.save(&edits)?;
    println!("Saved {} change(s) to {label}", edits.len());

    Ok(())
}

/// `<copies>/reports/executive_summary_2024-2025_term1_all.docx`
fn default_report_path(
    copies: &Path,
    year: YearRange,
    term: Term,
    standard: StandardChoice,
) -> PathBuf {
    copies.join("reports").join(format!(
        "executive_summary_{year}_{term}_{}.docx",
        standard.tag()
    ))
}

fn page_path(report: &Path, month: Month) -> PathBuf {
    let stem = report
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    report.with_file_name(format!("{stem}_{}.docx", month.name().to_lowercase()))
}

/// Month groups of the report, in term order or in the order they were asked for
fn report_months(ledger: &Ledger, term: Term, wanted: &[String]) -> AppResult<Vec<(Month, String)>> {
    let ordered = term.order(&ledger.layout().groups);

    let months = if wanted.is_empty() {
        ordered
            .iter()
            .map(|(month, group)| (*month, group.label.clone()))
            .collect::<Vec<_>>()
    } else {
        wanted
            .iter()
            .map(|label| {
                let unknown = || AppError::from(LedgerError::UnknownMonth(label.clone()));
                let month = Month::parse(label).ok_or_else(unknown)?;
                ordered
                    .iter()
                    .find(|(m, _)| *m == month)
                    .map(|(m, group)| (*m, group.label.clone()))
                    .ok_or_else(unknown)
            })
            .collect::<AppResult<Vec<_>>>()?
    };

    if months.is_empty() {
        return Err(AppError::Usage(format!(
            "{} has no months of {}",
            ledger.sheet(),
            term.title()
        )));
    }

    Ok(months)
}

fn report(ctx: &Context, args: ReportArgs) -> AppResult<()> {
    let Some(path) = ctx.workbook(args.file)? else {
        return Ok(());
    };
    let copy = CopyName::from_path(&path);

    let term = match (&args.term, copy) {
        (Some(term), _) => term.parse::<Term>()?,
        (None, Some(copy)) => copy.term,
        (None, None) => {
            return Err(AppError::Usage(format!(
                "the term can not be read from {}, use --term",
                path.display()
            )))
        }
    };
    let year = match (&args.year, copy) {
        (Some(year), _) => YearRange::parse(year)?,
        (None, Some(copy)) => copy.year,
        (None, None) => {
            return Err(AppError::Usage(format!(
                "the year can not be read from {}, use --year",
                path.display()
            )))
        }
    };

    let start = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let Some(template) = ctx.pick(args.template, "Word template", start, &[WORD])? else {
        return Ok(());
    };

    let ledger = open_ledger(&path, Some(term.sheet_name()))?;
    let views = report_months(&ledger, term, &args.months)?
        .into_iter()
        .map(|(month, label)| Ok((month, ledger.month_view(&label)?)))
        .collect::<AppResult<Vec<_>>>()?;

    let info = ReportInfo {
        term,
        year: year.to_string(),
        standards: args.standard.standards(),
    };
    log::info!(
        "Making the {} report of {} for {}, {} month(s)",
        info.standard_label(),
        term.title(),
        info.year,
        views.len()
    );

    let report = ReportBuilder::new(DocxPackage::open(&template)?, info).build(&views)?;

    let out = args
        .out
        .unwrap_or_else(|| default_report_path(&ctx.copies, year, term, args.standard));
    report.document.save(&out)?;
    println!("{}", out.display());

    if args.keep_pages {
        for (month, page) in &report.pages {
            let page_out = page_path(&out, *month);
            page.save(&page_out)?;
            println!("{}", page_out.display());
        }
    }

    if args.pdf {
        let pdf = Converter::new(args.converter).to_pdf(&out)?;
        println!("{}", pdf.display());
    }

    ctx.notify(&format!("The report was saved as {}", out.display()));
    Ok(())
}
