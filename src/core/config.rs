//! Rate tables for one tax year, supplied as data.

use super::schedule::{ConfigurationError, TaxBracketSchedule, MAX_AMOUNT, MAX_RATE};
use super::uk::TaxYear;
use anyhow::Context;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Flat rate above an allowance, chosen by the taxpayer's income tax band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BandRates {
    #[serde(default)]
    #[schemars(with = "f64")]
    pub allowance: Decimal,
    /// One rate per income tax tier, lowest band first
    #[schemars(with = "Vec<f64>")]
    pub rates: Vec<Decimal>,
}

impl BandRates {
    pub fn rate_for(&self, band: usize) -> Decimal {
        self.rates
            .get(band)
            .or_else(|| self.rates.last())
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn tax_on(&self, amount: Decimal, band: usize) -> Decimal {
        (amount - self.allowance).max(Decimal::ZERO) * self.rate_for(band)
    }

    fn validate(&self, schedule: &str, bands: usize) -> Result<(), ConfigurationError> {
        if self.rates.len() != bands {
            return Err(ConfigurationError::BandRateCount {
                schedule: schedule.to_string(),
                expected: bands,
                found: self.rates.len(),
            });
        }
        if self.allowance < Decimal::ZERO {
            return Err(ConfigurationError::NegativeAllowance {
                schedule: schedule.to_string(),
                allowance: self.allowance,
            });
        }
        if self.allowance > MAX_AMOUNT {
            return Err(ConfigurationError::OutOfRange {
                schedule: schedule.to_string(),
                field: "allowance",
                value: self.allowance,
            });
        }
        for (index, &rate) in self.rates.iter().enumerate() {
            if rate < Decimal::ZERO {
                return Err(ConfigurationError::NegativeRate {
                    schedule: schedule.to_string(),
                    index,
                    rate,
                });
            }
            if rate > MAX_RATE {
                return Err(ConfigurationError::OutOfRange {
                    schedule: schedule.to_string(),
                    field: "rate",
                    value: rate,
                });
            }
        }
        Ok(())
    }
}

/// Per-dependent benefit with an income taper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DependentBenefit {
    /// Annual amount for the first dependent
    #[schemars(with = "f64")]
    pub first_rate: Decimal,
    /// Annual amount for each further dependent
    #[schemars(with = "f64")]
    pub additional_rate: Decimal,
    /// Income above which the benefit starts to be clawed back
    #[schemars(with = "f64")]
    pub clawback_threshold: Decimal,
    /// Income range over which the benefit tapers to zero
    #[schemars(with = "f64")]
    pub clawback_span: Decimal,
}

impl DependentBenefit {
    /// Share of the benefit withdrawn at `income`, between 0 and 1.
    pub fn taper_fraction(&self, income: Decimal) -> Decimal {
        if self.clawback_span <= Decimal::ZERO {
            return Decimal::ONE;
        }
        let excess = (income - self.clawback_threshold).max(Decimal::ZERO);
        if excess >= self.clawback_span {
            Decimal::ONE
        } else {
            excess / self.clawback_span
        }
    }

    /// Benefit after clawback.
    pub fn amount(&self, dependents: u32, income: Decimal) -> Decimal {
        if dependents == 0 {
            return Decimal::ZERO;
        }
        let gross = self.first_rate + self.additional_rate * Decimal::from(dependents - 1);
        gross * (Decimal::ONE - self.taper_fraction(income))
    }

    /// Income at or above which nothing is paid.
    pub fn upper_bound(&self) -> Decimal {
        self.clawback_threshold + self.clawback_span
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        let schedule = "dependent benefit";
        for (field, value) in [
            ("firstRate", self.first_rate),
            ("additionalRate", self.additional_rate),
            ("clawbackThreshold", self.clawback_threshold),
        ] {
            if value < Decimal::ZERO {
                return Err(ConfigurationError::NegativeValue {
                    schedule: schedule.to_string(),
                    field,
                    value,
                });
            }
        }
        if self.clawback_span <= Decimal::ZERO {
            return Err(ConfigurationError::NonPositiveClawbackSpan {
                schedule: schedule.to_string(),
                span: self.clawback_span,
            });
        }
        for (field, value) in [
            ("firstRate", self.first_rate),
            ("additionalRate", self.additional_rate),
            ("clawbackThreshold", self.clawback_threshold),
            ("clawbackSpan", self.clawback_span),
        ] {
            if value > MAX_AMOUNT {
                return Err(ConfigurationError::OutOfRange {
                    schedule: schedule.to_string(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Every constant the baseline needs for one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaxConfig {
    pub tax_year: TaxYear,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub income_tax: TaxBracketSchedule,
    pub national_insurance: TaxBracketSchedule,
    pub dividends: BandRates,
    pub capital_gains: BandRates,
    pub dependent_benefit: DependentBenefit,
}

impl TaxConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.income_tax.validate()?;
        self.national_insurance.validate()?;
        let bands = self.income_tax.tiers.len();
        self.dividends.validate("dividends", bands)?;
        self.capital_gains.validate("capital gains", bands)?;
        self.dependent_benefit.validate()
    }

    /// Read a JSON config and check its invariants.
    pub fn from_reader<R: Read>(reader: R) -> anyhow::Result<TaxConfig> {
        let config: TaxConfig =
            serde_json::from_reader(reader).context("failed to parse tax configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Rate tables bundled with the binary.
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub tax_year: TaxYear,
    source: &'static str,
}

const PRESETS: &[Preset] = &[
    Preset {
        tax_year: TaxYear(2020),
        source: include_str!("../../presets/uk-2019-20.json"),
    },
    Preset {
        tax_year: TaxYear(2024),
        source: include_str!("../../presets/uk-2023-24.json"),
    },
];

impl Preset {
    pub fn all() -> &'static [Preset] {
        PRESETS
    }

    pub fn find(tax_year: TaxYear) -> Option<&'static Preset> {
        PRESETS.iter().find(|p| p.tax_year == tax_year)
    }

    /// Latest preset not after `tax_year`, falling back to the earliest one.
    pub fn latest_for(tax_year: TaxYear) -> Option<&'static Preset> {
        PRESETS
            .iter()
            .filter(|p| p.tax_year <= tax_year)
            .max_by_key(|p| p.tax_year)
            .or_else(|| PRESETS.iter().min_by_key(|p| p.tax_year))
    }

    pub fn load(&self) -> anyhow::Result<TaxConfig> {
        let config = TaxConfig::from_reader(self.source.as_bytes())
            .with_context(|| format!("bundled preset for {}", self.tax_year))?;
        anyhow::ensure!(
            config.tax_year == self.tax_year,
            "bundled preset for {} declares tax year {}",
            self.tax_year,
            config.tax_year
        );
        Ok(config)
    }
}
