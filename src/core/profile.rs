use super::schedule::MAX_AMOUNT;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use taxdelta_derive::CsvSchema;

/// Column description generated by `#[derive(CsvSchema)]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvField {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
    pub example: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum FilingStatus {
    #[default]
    Single,
    Married,
    HeadOfHousehold,
}

impl FilingStatus {
    pub fn display(&self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::Married => "married",
            FilingStatus::HeadOfHousehold => "headOfHousehold",
        }
    }
}

impl FromStr for FilingStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "single" => Ok(FilingStatus::Single),
            "married" => Ok(FilingStatus::Married),
            "headofhousehold" => Ok(FilingStatus::HeadOfHousehold),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Profile as entered, before any checks. Values may be text or numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, CsvSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    /// single, married or headOfHousehold
    #[csv(required, example = "single")]
    #[serde(default, deserialize_with = "text_or_number")]
    pub filing_status: Option<String>,
    /// Gross annual employment income
    #[csv(required, example = "60000")]
    #[serde(default, deserialize_with = "text_or_number")]
    pub annual_income: Option<String>,
    /// Dividend income for the year
    #[csv(required, example = "0")]
    #[serde(default, deserialize_with = "text_or_number")]
    pub dividends: Option<String>,
    /// Realised capital gains for the year
    #[csv(required, example = "0")]
    #[serde(default, deserialize_with = "text_or_number")]
    pub capital_gains: Option<String>,
    /// Age in whole years
    #[csv(required, example = "40")]
    #[serde(default, deserialize_with = "text_or_number")]
    pub age: Option<String>,
    /// Number of dependent children
    #[csv(required, example = "2")]
    #[serde(default, deserialize_with = "text_or_number")]
    pub dependents: Option<String>,
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FieldVisitor;

    impl<'de> Visitor<'de> for FieldVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or a number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(FieldVisitor)
        }
    }

    deserializer.deserialize_any(FieldVisitor)
}

/// What is wrong with a profile field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Problem {
    Missing,
    NotNumeric,
    Negative,
    NotWholeNumber,
    OutOfRange,
    UnknownFilingStatus,
}

impl Problem {
    pub fn display(&self) -> &'static str {
        match self {
            Problem::Missing => "is required",
            Problem::NotNumeric => "must be a number",
            Problem::Negative => "must not be negative",
            Problem::NotWholeNumber => "must be a whole number",
            Problem::OutOfRange => "is too large",
            Problem::UnknownFilingStatus => "must be single, married or headOfHousehold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub problem: Problem,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.problem.display())
    }
}

/// Every offending field of a rejected profile
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid profile: {}", join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn fields(&self) -> Vec<&'static str> {
        self.issues.iter().map(|issue| issue.field).collect()
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validated taxpayer facts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaxpayerProfile {
    pub filing_status: FilingStatus,
    #[schemars(with = "f64")]
    pub annual_income: Decimal,
    #[schemars(with = "f64")]
    pub dividends: Decimal,
    #[schemars(with = "f64")]
    pub capital_gains: Decimal,
    pub age: u32,
    pub dependents: u32,
}

impl TaxpayerProfile {
    /// Range check on the monetary fields: none negative, none above [`MAX_AMOUNT`]
    pub fn validate(&self) -> Result<(), ValidationError> {
        let issues: Vec<FieldIssue> = [
            ("annualIncome", self.annual_income),
            ("dividends", self.dividends),
            ("capitalGains", self.capital_gains),
        ]
        .into_iter()
        .filter_map(|(field, amount)| {
            amount_problem(amount).map(|problem| FieldIssue { field, problem })
        })
        .collect();

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

impl TryFrom<&ProfileInput> for TaxpayerProfile {
    type Error = ValidationError;

    fn try_from(input: &ProfileInput) -> Result<Self, Self::Error> {
        let mut issues = Vec::new();

        let filing_status = match present(&input.filing_status) {
            None => {
                issues.push(FieldIssue {
                    field: "filingStatus",
                    problem: Problem::Missing,
                });
                None
            }
            Some(s) => {
                let status = s.parse::<FilingStatus>().ok();
                if status.is_none() {
                    issues.push(FieldIssue {
                        field: "filingStatus",
                        problem: Problem::UnknownFilingStatus,
                    });
                }
                status
            }
        };
        let annual_income = money("annualIncome", &input.annual_income, &mut issues);
        let dividends = money("dividends", &input.dividends, &mut issues);
        let capital_gains = money("capitalGains", &input.capital_gains, &mut issues);
        let age = count("age", &input.age, &mut issues);
        let dependents = count("dependents", &input.dependents, &mut issues);

        match (
            filing_status,
            annual_income,
            dividends,
            capital_gains,
            age,
            dependents,
        ) {
            (
                Some(filing_status),
                Some(annual_income),
                Some(dividends),
                Some(capital_gains),
                Some(age),
                Some(dependents),
            ) if issues.is_empty() => Ok(TaxpayerProfile {
                filing_status,
                annual_income,
                dividends,
                capital_gains,
                age,
                dependents,
            }),
            _ => Err(ValidationError { issues }),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn money(
    field: &'static str,
    value: &Option<String>,
    issues: &mut Vec<FieldIssue>,
) -> Option<Decimal> {
    let Some(text) = present(value) else {
        issues.push(FieldIssue {
            field,
            problem: Problem::Missing,
        });
        return None;
    };
    let parsed = Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text));
    let problem = match parsed {
        Ok(amount) => match amount_problem(amount) {
            None => return Some(amount),
            Some(problem) => problem,
        },
        // Numbers Decimal cannot hold, such as 1e30
        Err(_) => match text.parse::<f64>() {
            Ok(n) if n.is_finite() && n < 0.0 => Problem::Negative,
            Ok(n) if n.is_finite() => Problem::OutOfRange,
            _ => Problem::NotNumeric,
        },
    };
    issues.push(FieldIssue { field, problem });
    None
}

fn amount_problem(amount: Decimal) -> Option<Problem> {
    if amount < Decimal::ZERO {
        Some(Problem::Negative)
    } else if amount > MAX_AMOUNT {
        Some(Problem::OutOfRange)
    } else {
        None
    }
}

fn count(field: &'static str, value: &Option<String>, issues: &mut Vec<FieldIssue>) -> Option<u32> {
    let amount = money(field, value, issues)?;
    if !amount.fract().is_zero() {
        issues.push(FieldIssue {
            field,
            problem: Problem::NotWholeNumber,
        });
        return None;
    }
    let whole = amount.to_u32();
    if whole.is_none() {
        issues.push(FieldIssue {
            field,
            problem: Problem::OutOfRange,
        });
    }
    whole
}
