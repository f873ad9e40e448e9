use chrono::{Datelike, Local, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// UK Tax Year (runs 6 April to 5 April)
/// The year value represents the end year (e.g., 2024 = 2023/24 tax year)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct TaxYear(pub i32);

impl TaxYear {
    /// Tax year containing the given date
    pub fn from_date(date: NaiveDate) -> Self {
        let year = date.year();
        // On or after 6 April belongs to the year ending next April
        let starts_here = NaiveDate::from_ymd_opt(year, 4, 6).is_some_and(|start| date >= start);
        if starts_here {
            TaxYear(year + 1)
        } else {
            TaxYear(year)
        }
    }

    /// Tax year containing today's date
    pub fn current() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    /// Start date of the tax year (6 April of previous year)
    pub fn start_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0 - 1, 4, 6)
    }

    /// End date of the tax year (5 April)
    pub fn end_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0, 4, 5)
    }

    /// Display as "2023/24" format
    pub fn display(&self) -> String {
        format!("{}/{:02}", self.0 - 1, self.0.rem_euclid(100))
    }

    /// Parse either the end year ("2024") or the span form ("2023/24")
    pub fn parse(s: &str) -> Option<TaxYear> {
        let s = s.trim();
        match s.split_once('/') {
            None => s.parse().ok().map(TaxYear),
            Some((start, end)) => {
                let start: i32 = start.parse().ok()?;
                let end: i32 = end.parse().ok()?;
                ((start + 1).rem_euclid(100) == end).then_some(TaxYear(start + 1))
            }
        }
    }
}

impl std::fmt::Display for TaxYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tax_year_from_date_before_april_6() {
        // 5 April 2024 is in 2023/24 tax year
        let date = NaiveDate::from_ymd_opt(2024, 4, 5).unwrap();
        assert_eq!(TaxYear::from_date(date), TaxYear(2024));
    }

    #[test]
    fn tax_year_from_date_on_april_6() {
        // 6 April 2024 is in 2024/25 tax year
        let date = NaiveDate::from_ymd_opt(2024, 4, 6).unwrap();
        assert_eq!(TaxYear::from_date(date), TaxYear(2025));
    }

    #[test]
    fn tax_year_from_date_december() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(TaxYear::from_date(date), TaxYear(2024));
    }

    #[test]
    fn tax_year_display() {
        assert_eq!(TaxYear(2020).display(), "2019/20");
        assert_eq!(TaxYear(2024).display(), "2023/24");
        assert_eq!(TaxYear(2001).display(), "2000/01");
    }

    #[test]
    fn tax_year_start_end_dates() {
        let ty = TaxYear(2024);
        assert_eq!(ty.start_date(), NaiveDate::from_ymd_opt(2023, 4, 6));
        assert_eq!(ty.end_date(), NaiveDate::from_ymd_opt(2024, 4, 5));
    }

    #[test]
    fn tax_year_parse() {
        assert_eq!(TaxYear::parse("2024"), Some(TaxYear(2024)));
        assert_eq!(TaxYear::parse("2023/24"), Some(TaxYear(2024)));
        assert_eq!(TaxYear::parse(" 2019/20 "), Some(TaxYear(2020)));
        assert_eq!(TaxYear::parse("2023/25"), None);
        assert_eq!(TaxYear::parse("next year"), None);
    }
}
