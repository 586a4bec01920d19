//! Positional layout of an allocation sheet.
//!
//! Row 1 holds `SR.NO.`, `INITIALS` and then one header per month group (plus a `TOTAL` group),
//! row 2 the sub-headers of every group and the rows below one teacher each. Rows naming a
//! standard (`FYJC`, `SYJC (XII)`...) in the initials column open a section of that standard.

use crate::{
    calendar::Standard,
    field::{data_text, Field},
    LedgerError, LedgerResult,
};
use calamine::{Data, Range};
use strings::normalize_label;

const HEADER_ROW: u32 = 0;
const SUB_HEADER_ROW: u32 = 1;
const FIRST_DATA_ROW: u32 = 2;
const INITIALS_COL: u32 = 1;
const FIRST_GROUP_COL: u32 = 2;

/// Columns under one month header, 0-based and inclusive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGroup {
    pub label: String,
    pub first_col: u32,
    pub last_col: u32,
}

impl MonthGroup {
    #[must_use]
    pub fn is_total(&self) -> bool {
        normalize_label(&self.label) == "TOTAL"
    }

    #[must_use]
    pub fn columns(&self) -> std::ops::RangeInclusive<u32> {
        self.first_col..=self.last_col
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeacherRow {
    /// 0-based sheet row
    pub row: u32,
    pub initials: String,
    /// Section the row belongs to, `None` when the sheet has no sections above it
    pub standard: Option<Standard>,
}

impl TeacherRow {
    #[must_use]
    pub fn applies_to(&self, standard: Standard) -> bool {
        self.standard.map_or(true, |s| s == standard)
    }
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub groups: Vec<MonthGroup>,
    pub sub_headers: Vec<Option<String>>,
    pub teachers: Vec<TeacherRow>,
}

impl Layout {
    /// Read the layout of a sheet loaded with cached values
    ///
    /// # Errors
    ///
    /// Fails with [`LedgerError::NoMonths`] when the first row has no month header
    pub fn from_range(sheet: &str, range: &Range<Data>) -> LedgerResult<Layout> {
        let Some((last_row, last_col)) = range.end() else {
            return Err(LedgerError::NoMonths(sheet.to_string()));
        };

        let mut groups: Vec<MonthGroup> = Vec::new();
        for col in FIRST_GROUP_COL..=last_col {
            let Some(Data::String(header)) = range.get_value((HEADER_ROW, col)) else {
                continue;
            };
            let header = header.trim();
            if header.is_empty() || matches!(normalize_label(header).as_str(), "SR.NO." | "INITIALS") {
                continue;
            }

            if let Some(previous) = groups.last_mut() {
                previous.last_col = col - 1;
            }
            groups.push(MonthGroup {
                label: header.to_string(),
                first_col: col,
                last_col,
            });
        }

        if groups.is_empty() {
            return Err(LedgerError::NoMonths(sheet.to_string()));
        }

        let sub_headers = (0..=last_col)
            .map(|col| {
                range
                    .get_value((SUB_HEADER_ROW, col))
                    .and_then(data_text)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            })
            .collect();

        let mut teachers = Vec::new();
        let mut section = None;
        for row in FIRST_DATA_ROW..=last_row {
            let Some(initials) = range
                .get_value((row, INITIALS_COL))
                .and_then(data_text)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
            else {
                continue;
            };

            if normalize_label(&initials) == "TOTAL" {
                continue;
            }

            if let Some(standard) = Standard::from_section_label(&initials) {
                log::debug!("{sheet}: row {} opens the {standard} section", row + 1);
                section = Some(standard);
                continue;
            }

            teachers.push(TeacherRow {
                row,
                initials,
                standard: section,
            });
        }

        Ok(Layout {
            groups,
            sub_headers,
            teachers,
        })
    }

    #[must_use]
    pub fn months(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.label.as_str())
    }

    /// Group whose header matches `month`, ignoring case and spacing
    #[must_use]
    pub fn group(&self, month: &str) -> Option<&MonthGroup> {
        let month = normalize_label(month);
        self.groups
            .iter()
            .find(|g| normalize_label(&g.label) == month)
    }

    /// Editable fields of a group with their columns, in sheet order. A field repeated inside a
    /// group keeps its first column.
    #[must_use]
    pub fn fields(&self, group: &MonthGroup) -> Vec<(Field, u32)> {
        let mut fields: Vec<(Field, u32)> = Vec::new();

        for col in group.columns() {
            let Some(field) = self
                .sub_headers
                .get(col as usize)
                .and_then(Option::as_deref)
                .and_then(Field::from_header)
            else {
                continue;
            };

            if fields.iter().any(|(f, _)| *f == field) {
                log::debug!("{}: {field} repeated at column {}", group.label, col + 1);
                continue;
            }
            fields.push((field, col));
        }

        fields
    }

    #[must_use]
    pub fn teacher(&self, initials: &str) -> Option<&TeacherRow> {
        let initials = normalize_label(initials);
        self.teachers
            .iter()
            .find(|t| normalize_label(&t.initials) == initials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(rows: &[&[Data]]) -> Range<Data> {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut range = Range::new((0, 0), (rows.len() as u32 - 1, width as u32 - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), value.clone());
            }
        }
        range
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    #[test]
    fn groups_run_until_the_next_header() {
        let e = Data::Empty;
        let range = range(&[
            &[s("SR.NO."), s("INITIALS"), s("JUNE"), e.clone(), e.clone(), s("JULY"), e.clone(), s("TOTAL"), e.clone()],
            &[e.clone(), e.clone(), s("ALOTTED"), s("E-Act"), s("E-Add"), s("ALOTTED"), s("E-Add"), s("ALOTTED"), s("E-Act")],
            &[Data::Float(1.0), s("AB"), Data::Float(4.0)],
            &[Data::Float(2.0), s("TOTAL")],
        ]);

        let layout = Layout::from_range("term1", &range).unwrap();

        assert_eq!(
            layout.groups,
            vec![
                MonthGroup { label: "JUNE".into(), first_col: 2, last_col: 4 },
                MonthGroup { label: "JULY".into(), first_col: 5, last_col: 6 },
                MonthGroup { label: "TOTAL".into(), first_col: 7, last_col: 8 },
            ]
        );
        assert_eq!(layout.teachers.len(), 1);
        assert_eq!(layout.teachers[0].row, 2);

        let july = layout.group("july").unwrap();
        assert_eq!(layout.fields(july), vec![(Field::Alotted, 5), (Field::EAdd, 6)]);
    }

    #[test]
    fn sections_split_teachers() {
        let e = Data::Empty;
        let range = range(&[
            &[s("SR.NO."), s("INITIALS"), s("JUNE")],
            &[e.clone(), e.clone(), s("ALOTTED")],
            &[Data::Float(1.0), s("AB")],
            &[e.clone(), s("FYJC (XI)")],
            &[Data::Float(2.0), s("CD")],
            &[e.clone(), s("SYJC")],
            &[Data::Float(3.0), s("EF")],
            &[e.clone(), e.clone()],
        ]);

        let layout = Layout::from_range("term1", &range).unwrap();
        let sections = layout
            .teachers
            .iter()
            .map(|t| (t.initials.as_str(), t.standard))
            .collect::<Vec<_>>();

        assert_eq!(
            sections,
            vec![
                ("AB", None),
                ("CD", Some(Standard::Fyjc)),
                ("EF", Some(Standard::Syjc)),
            ]
        );
        assert!(layout.teachers[0].applies_to(Standard::Syjc));
        assert!(!layout.teachers[1].applies_to(Standard::Syjc));
    }

    #[test]
    fn sheet_without_months() {
        let range = range(&[&[s("SR.NO."), s("INITIALS")], &[Data::Empty, Data::Empty]]);

        assert!(matches!(
            Layout::from_range("term1", &range),
            Err(LedgerError::NoMonths(_))
        ));
    }
}
