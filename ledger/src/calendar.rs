//! Months, terms and standards: the calendar vocabulary of the allocation sheets.

use crate::{layout::MonthGroup, LedgerError};
use std::{fmt, str::FromStr};
use strings::{closest, normalize_label, tokens};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Month::January => "JANUARY",
            Month::February => "FEBRUARY",
            Month::March => "MARCH",
            Month::April => "APRIL",
            Month::May => "MAY",
            Month::June => "JUNE",
            Month::July => "JULY",
            Month::August => "AUGUST",
            Month::September => "SEPTEMBER",
            Month::October => "OCTOBER",
            Month::November => "NOVEMBER",
            Month::December => "DECEMBER",
        }
    }

    /// Name with only the first letter in uppercase, `June`
    #[must_use]
    pub fn title(self) -> String {
        let name = self.name();
        let (first, rest) = name.split_at(1);
        format!("{first}{}", rest.to_lowercase())
    }

    /// Recognize the month a sheet header talks about. Headers are typed by hand, so `Sept`,
    /// `JUNE-24` and small misspellings are accepted.
    ///
    /// # Examples
    ///
    /// ```
    /// use ledger::Month;
    ///
    /// assert_eq!(Month::parse("Sept"), Some(Month::September));
    /// assert_eq!(Month::parse("JUNE-24"), Some(Month::June));
    /// assert_eq!(Month::parse("TOTAL"), None);
    /// ```
    #[must_use]
    pub fn parse(label: &str) -> Option<Month> {
        let label = normalize_label(label);
        let word = label
            .chars()
            .take_while(|c| c.is_alphabetic())
            .collect::<String>();

        if word.chars().count() >= 3 {
            let prefix = word.chars().take(3).collect::<String>();
            if let Some(month) = Month::ALL.into_iter().find(|m| m.name().starts_with(&prefix)) {
                return Some(month);
            }
        }

        let name = closest(&word, Month::ALL.iter().map(|m| m.name()), 2)?;
        Month::ALL.into_iter().find(|m| m.name() == name)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Half-year reporting period. Its lowercase name is also the name of the sheet holding it in the
/// master workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Term {
    Term1,
    Term2,
}

impl Term {
    pub const ALL: [Term; 2] = [Term::Term1, Term::Term2];

    #[must_use]
    pub fn sheet_name(self) -> &'static str {
        match self {
            Term::Term1 => "term1",
            Term::Term2 => "term2",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Term::Term1 => "Term 1",
            Term::Term2 => "Term 2",
        }
    }

    /// Months in reporting order
    #[must_use]
    pub fn months(self) -> &'static [Month] {
        match self {
            Term::Term1 => &[
                Month::June,
                Month::July,
                Month::August,
                Month::September,
                Month::October,
            ],
            Term::Term2 => &[
                Month::November,
                Month::December,
                Month::January,
                Month::February,
            ],
        }
    }

    /// `June to October`
    #[must_use]
    pub fn span(self) -> String {
        let months = self.months();
        match (months.first(), months.last()) {
            (Some(first), Some(last)) => format!("{} to {}", first.title(), last.title()),
            _ => String::new(),
        }
    }

    #[must_use]
    pub fn of_month(month: Month) -> Option<Term> {
        Term::ALL.into_iter().find(|t| t.months().contains(&month))
    }

    /// Month groups of a sheet in the reporting order of the term. `TOTAL` and months that do not
    /// belong to the term are left out.
    #[must_use]
    pub fn order<'a>(self, groups: &'a [MonthGroup]) -> Vec<(Month, &'a MonthGroup)> {
        self.months()
            .iter()
            .filter_map(|m| {
                groups
                    .iter()
                    .filter(|g| !g.is_total())
                    .find(|g| Month::parse(&g.label) == Some(*m))
                    .map(|g| (*m, g))
            })
            .collect()
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sheet_name())
    }
}

impl FromStr for Term {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact = normalize_label(s).replace(' ', "");
        match compact.as_str() {
            "TERM1" | "T1" | "1" | "I" => Ok(Term::Term1),
            "TERM2" | "T2" | "2" | "II" => Ok(Term::Term2),
            _ => Err(LedgerError::InvalidTerm(s.to_string())),
        }
    }
}

/// Academic grade grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Standard {
    /// First year junior college, standard XI
    Fyjc,
    /// Second year junior college, standard XII
    Syjc,
}

const SECTION_WORDS: [&str; 5] = ["FYJC", "XI", "SYJC", "XII", "STD"];

impl Standard {
    pub const ALL: [Standard; 2] = [Standard::Fyjc, Standard::Syjc];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Standard::Fyjc => "FYJC",
            Standard::Syjc => "SYJC",
        }
    }

    #[must_use]
    pub fn roman(self) -> &'static str {
        match self {
            Standard::Fyjc => "XI",
            Standard::Syjc => "XII",
        }
    }

    /// Standard named by a set of label tokens. Labels naming both standards name none.
    #[must_use]
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Option<Standard> {
        let has = |words: [&str; 2]| tokens.iter().any(|t| words.contains(&t.as_ref()));

        match (has(["XI", "FYJC"]), has(["XII", "SYJC"])) {
            (true, false) => Some(Standard::Fyjc),
            (false, true) => Some(Standard::Syjc),
            _ => None,
        }
    }

    /// Section rows of the sheet split teachers by standard: `FYJC`, `XI`, `FYJC (XI)`, `STD XII`...
    #[must_use]
    pub fn from_section_label(label: &str) -> Option<Standard> {
        let tokens = tokens(label);
        if tokens.is_empty() || !tokens.iter().all(|t| SECTION_WORDS.contains(&t.as_str())) {
            return None;
        }

        Standard::from_tokens(&tokens)
    }
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.roman())
    }
}

impl FromStr for Standard {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "XI" | "FYJC" | "11" => Ok(Standard::Fyjc),
            "XII" | "SYJC" | "12" => Ok(Standard::Syjc),
            _ => Standard::from_section_label(s)
                .ok_or_else(|| LedgerError::InvalidStandard(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_labels() {
        assert_eq!(Month::parse(" june "), Some(Month::June));
        assert_eq!(Month::parse("JUL"), Some(Month::July));
        assert_eq!(Month::parse("Septmber"), Some(Month::September));
        assert_eq!(Month::parse("Dec 2024"), Some(Month::December));
        assert_eq!(Month::parse("Juily"), Some(Month::July));
        assert_eq!(Month::parse("INITIALS"), None);
        assert_eq!(Month::parse(""), None);
    }

    #[test]
    fn term_months_wrap_the_year() {
        assert_eq!(
            Term::Term2.months(),
            &[
                Month::November,
                Month::December,
                Month::January,
                Month::February
            ]
        );
        assert_eq!(Term::Term1.span(), "June to October");
        assert_eq!(Term::of_month(Month::January), Some(Term::Term2));
        assert_eq!(Term::of_month(Month::April), None);
    }

    #[test]
    fn term_names() {
        assert_eq!("term1".parse::<Term>().ok(), Some(Term::Term1));
        assert_eq!("Term 2".parse::<Term>().ok(), Some(Term::Term2));
        assert_eq!("t1".parse::<Term>().ok(), Some(Term::Term1));
        assert!("term3".parse::<Term>().is_err());
    }

    #[test]
    fn term_order_skips_total_and_foreign_months() {
        let groups = ["JULY", "JUNE", "NOVEMBER", "TOTAL"]
            .iter()
            .enumerate()
            .map(|(i, l)| MonthGroup {
                label: (*l).to_string(),
                first_col: 2 + 3 * i as u32,
                last_col: 4 + 3 * i as u32,
            })
            .collect::<Vec<_>>();

        let order = Term::Term1
            .order(&groups)
            .into_iter()
            .map(|(m, g)| (m, g.label.as_str()))
            .collect::<Vec<_>>();

        assert_eq!(order, vec![(Month::June, "JUNE"), (Month::July, "JULY")]);
    }

    #[test]
    fn standards() {
        assert_eq!(Standard::from_section_label("FYJC (XI)"), Some(Standard::Fyjc));
        assert_eq!(Standard::from_section_label("std xii"), Some(Standard::Syjc));
        assert_eq!(Standard::from_section_label("XI & XII"), None);
        assert_eq!(Standard::from_section_label("AB"), None);
        assert_eq!("xii".parse::<Standard>().ok(), Some(Standard::Syjc));
        assert_eq!(Standard::Fyjc.to_string(), "FYJC (XI)");
    }
}
