use crate::LedgerError;
use calamine::Data;
use std::{fmt, str::FromStr};
use strings::{normalize_label, tokens};

/// Sub-headers of a month group that can be seen and edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Alotted,
    EAct,
    EAdd,
}

/// What ends up stored in a sheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Blank,
    Number(f64),
    Text(String),
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Alotted, Field::EAct, Field::EAdd];

    /// Label as written in the sheet
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Field::Alotted => "ALOTTED",
            Field::EAct => "E-Act",
            Field::EAdd => "E-Add",
        }
    }

    /// Identifier usable in placeholders and command lines
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Field::Alotted => "alotted",
            Field::EAct => "e_act",
            Field::EAdd => "e_add",
        }
    }

    /// # Examples
    ///
    /// ```
    /// use ledger::Field;
    ///
    /// assert_eq!(Field::from_header("Allotted"), Some(Field::Alotted));
    /// assert_eq!(Field::from_header("E - ADD"), Some(Field::EAdd));
    /// assert_eq!(Field::from_header("TOTAL"), None);
    /// ```
    #[must_use]
    pub fn from_header(header: &str) -> Option<Field> {
        match normalize_label(header).as_str() {
            "ALOTTED" | "ALLOTTED" | "ALLOTED" | "ALOTED" => return Some(Field::Alotted),
            _ => {}
        }

        match tokens(header).as_slice() {
            [e, act] if e == "E" && act == "ACT" => Some(Field::EAct),
            [e, add] if e == "E" && add == "ADD" => Some(Field::EAdd),
            [eact] if eact == "EACT" => Some(Field::EAct),
            [eadd] if eadd == "EADD" => Some(Field::EAdd),
            _ => None,
        }
    }

    /// Value shown to the user for a raw cell text
    ///
    /// `E-Add` cells hold a `+` marker that is never shown; the rest only hide empty cells and the
    /// `None` text left behind by older saves.
    #[must_use]
    pub fn display(self, raw: Option<&str>) -> String {
        let Some(raw) = raw else {
            return String::new();
        };
        let raw = raw.trim();

        match self {
            Field::EAdd if raw == "+" => String::new(),
            Field::EAdd => raw.replace('+', "").trim().to_string(),
            _ if raw.eq_ignore_ascii_case("none") => String::new(),
            _ => raw.to_string(),
        }
    }

    /// Value to store for what the user typed
    ///
    /// # Examples
    ///
    /// ```
    /// use ledger::{CellValue, Field};
    ///
    /// assert_eq!(Field::EAdd.store(" '3' "), CellValue::Text("+3".into()));
    /// assert_eq!(Field::EAdd.store(""), CellValue::Text("+".into()));
    /// assert_eq!(Field::Alotted.store("12"), CellValue::Number(12.0));
    /// assert_eq!(Field::EAct.store("none"), CellValue::Blank);
    /// ```
    #[must_use]
    pub fn store(self, input: &str) -> CellValue {
        let input = input.trim();

        match self {
            Field::EAdd => {
                let v = input.replace(['"', '\'', '+'], "");
                let v = v.trim();
                CellValue::Text(if v.is_empty() {
                    "+".to_string()
                } else {
                    format!("+{v}")
                })
            }
            _ if input.is_empty() || input.eq_ignore_ascii_case("none") => CellValue::Blank,
            _ => match input.parse::<f64>() {
                Ok(n) if n.is_finite() => CellValue::Number(n),
                _ => CellValue::Text(input.to_string()),
            },
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Field {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::from_header(s)
            .or_else(|| Field::ALL.into_iter().find(|f| f.key().eq_ignore_ascii_case(s.trim())))
            .ok_or_else(|| LedgerError::InvalidField(s.to_string()))
    }
}

/// Text of a cached cell value, `None` for empty cells
pub(crate) fn data_text(data: &Data) -> Option<String> {
    match data {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Numeric reading of a displayed value, used for totals
#[must_use]
pub fn numeric(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Number without a useless fractional part
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
