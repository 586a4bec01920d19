use crate::{
    calendar::Standard,
    field::{data_text, format_number, numeric, Field},
    layout::{Layout, MonthGroup},
};
use calamine::{Data, Range};

/// Editable values of one month, one row per teacher
#[derive(Debug, Clone)]
pub struct MonthView {
    pub month: String,
    /// Fields present in the month with their 0-based sheet columns
    pub fields: Vec<(Field, u32)>,
    pub rows: Vec<ViewRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    /// 0-based sheet row
    pub row: u32,
    pub initials: String,
    pub standard: Option<Standard>,
    /// Display values, one per field of the view
    pub values: Vec<String>,
}

impl MonthView {
    pub(crate) fn read(layout: &Layout, range: &Range<Data>, group: &MonthGroup) -> MonthView {
        let fields = layout.fields(group);

        let rows = layout
            .teachers
            .iter()
            .map(|teacher| ViewRow {
                row: teacher.row,
                initials: teacher.initials.clone(),
                standard: teacher.standard,
                values: fields
                    .iter()
                    .map(|(field, col)| {
                        let raw = range.get_value((teacher.row, *col)).and_then(data_text);
                        field.display(raw.as_deref())
                    })
                    .collect(),
            })
            .collect();

        MonthView {
            month: group.label.clone(),
            fields,
            rows,
        }
    }

    /// `Initial` followed by the labels of the fields
    #[must_use]
    pub fn headers(&self) -> Vec<&'static str> {
        std::iter::once("Initial")
            .chain(self.fields.iter().map(|(f, _)| f.label()))
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() || self.rows.is_empty()
    }

    /// Position of `field` among the values of a row
    #[must_use]
    pub fn position(&self, field: Field) -> Option<usize> {
        self.fields.iter().position(|(f, _)| *f == field)
    }

    #[must_use]
    pub fn column(&self, field: Field) -> Option<u32> {
        self.fields.iter().find(|(f, _)| *f == field).map(|(_, c)| *c)
    }

    #[must_use]
    pub fn value<'a>(&self, row: &'a ViewRow, field: Field) -> Option<&'a str> {
        self.position(field)
            .and_then(|i| row.values.get(i))
            .map(String::as_str)
    }

    /// Sum of the numeric values of `field` over the rows that apply to `standard` (all rows
    /// without a standard). Text values do not count.
    #[must_use]
    pub fn total(&self, field: Field, standard: Option<Standard>) -> String {
        let total = self
            .rows
            .iter()
            .filter(|r| match (standard, r.standard) {
                (Some(wanted), Some(section)) => wanted == section,
                _ => true,
            })
            .filter_map(|r| self.value(r, field))
            .filter_map(numeric)
            .sum::<f64>();

        format_number(total)
    }
}
