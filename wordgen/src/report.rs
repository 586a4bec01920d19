//! Executive summaries: one page of the template per month, merged into one document.

use crate::{
    merge::merge,
    package::DocxPackage,
    placeholder::{fill_placeholders, Values},
    table::{fill_data_table, FieldValues, TableData, TableRow},
    WordError, WordResult,
};
use itertools::Itertools;
use ledger::{Field, Month, MonthView, Standard, Term};
use std::collections::BTreeMap;

/// What a report is about, shared by all its pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportInfo {
    pub term: Term,
    pub year: String,
    pub standards: Vec<Standard>,
}

impl ReportInfo {
    /// `FYJC (XI)`, or `FYJC (XI) & SYJC (XII)` for both
    #[must_use]
    pub fn standard_label(&self) -> String {
        self.standards.iter().join(" & ")
    }

    /// Values for headers, footers and every page
    #[must_use]
    pub fn values(&self) -> Values {
        [
            ("term", self.term.title().to_string()),
            ("term_months", self.term.span()),
            ("year", self.year.clone()),
            ("standard", self.standard_label()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    /// Values of the page of `month`, numbered `page` of `pages`
    #[must_use]
    pub fn page_values(&self, month: Month, view: &MonthView, page: usize, pages: usize) -> Values {
        let mut values = self.values();
        values.insert("month".to_string(), view.month.clone());
        values.insert("month_title".to_string(), month.title());
        values.insert("page".to_string(), page.to_string());
        values.insert("pages".to_string(), pages.to_string());

        let single = match self.standards.as_slice() {
            [only] => Some(*only),
            _ => None,
        };
        for field in Field::ALL {
            let present = view.position(field).is_some();
            let total = |standard| {
                if present {
                    view.total(field, standard)
                } else {
                    String::new()
                }
            };

            values.insert(format!("total_{}", field.key()), total(single));
            for standard in Standard::ALL {
                values.insert(
                    format!("{}_total_{}", standard.roman().to_lowercase(), field.key()),
                    total(Some(standard)),
                );
            }
        }

        values
    }

    /// Rows and totals of the data table. Teachers outside the selected standards are left out,
    /// teachers of a sheet without sections count for every selected standard.
    #[must_use]
    pub fn table_data(&self, view: &MonthView) -> TableData {
        let rows = view
            .rows
            .iter()
            .filter_map(|row| {
                let values = self
                    .standards
                    .iter()
                    .filter(|s| row.standard.map_or(true, |own| own == **s))
                    .map(|s| {
                        let values = view
                            .fields
                            .iter()
                            .map(|(field, _)| *field)
                            .zip(row.values.iter().cloned())
                            .collect::<FieldValues>();
                        (*s, values)
                    })
                    .collect::<BTreeMap<_, _>>();

                (!values.is_empty()).then(|| TableRow {
                    initials: row.initials.clone(),
                    values,
                })
            })
            .collect();

        let totals = self
            .standards
            .iter()
            .map(|s| {
                let totals = view
                    .fields
                    .iter()
                    .map(|(field, _)| (*field, view.total(*field, Some(*s))))
                    .collect::<FieldValues>();
                (*s, totals)
            })
            .collect();

        TableData { rows, totals }
    }
}

/// The merged document, the pages it was made of and the placeholders nobody filled
#[derive(Debug, Clone)]
pub struct Report {
    pub document: DocxPackage,
    pub pages: Vec<(Month, DocxPackage)>,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ReportBuilder {
    template: DocxPackage,
    info: ReportInfo,
}

impl ReportBuilder {
    #[must_use]
    pub fn new(template: DocxPackage, info: ReportInfo) -> ReportBuilder {
        ReportBuilder { template, info }
    }

    #[must_use]
    pub fn info(&self) -> &ReportInfo {
        &self.info
    }

    /// Fill a copy of the template with the data of one month
    ///
    /// # Errors
    ///
    /// Fails if the template has no data table or its parts are not well formed
    pub fn page(
        &self,
        month: Month,
        view: &MonthView,
        page: usize,
        pages: usize,
    ) -> WordResult<(DocxPackage, Vec<String>)> {
        let mut doc = self.template.document()?;

        let values = self.info.page_values(month, view, page, pages);
        let mut missing = fill_placeholders(&mut doc.root, &values);
        fill_data_table(&mut doc.root, &self.info.table_data(view))?;

        let mut package = self.template.clone();
        package.set_document(&doc)?;

        let shared = self.info.values();
        for part in package.header_footer_parts() {
            let mut xml = package.xml_part(&part)?;
            missing.extend(fill_placeholders(&mut xml.root, &shared));
            package.set_xml_part(&part, &xml)?;
        }

        missing.sort();
        missing.dedup();
        Ok((package, missing))
    }

    /// One page per month, in the given order, and the merged document
    ///
    /// # Errors
    ///
    /// Fails with [`WordError::NothingToMerge`] without months, or if a page can not be made
    pub fn build(&self, months: &[(Month, MonthView)]) -> WordResult<Report> {
        if months.is_empty() {
            return Err(WordError::NothingToMerge);
        }

        let mut pages = Vec::with_capacity(months.len());
        let mut missing = Vec::new();
        for (i, (month, view)) in months.iter().enumerate() {
            if view.is_empty() {
                log::warn!("{} has no teacher rows", view.month);
            }

            let (page, page_missing) = self.page(*month, view, i + 1, months.len())?;
            log::info!("Filled the page of {}", month.title());
            missing.extend(page_missing);
            pages.push((*month, page));
        }

        missing.sort();
        missing.dedup();
        for name in &missing {
            log::warn!("The template uses {{{{{name}}}}} but there is no value for it");
        }

        let document = merge(&pages.iter().map(|(_, p)| p.clone()).collect::<Vec<_>>())?;

        Ok(Report {
            document,
            pages,
            missing,
        })
    }
}
