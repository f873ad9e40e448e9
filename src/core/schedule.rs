use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Largest money amount accepted in a profile or rate table (one quadrillion).
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000);

/// Largest magnitude accepted for a rate, multiplier or per-dependent amount.
pub const MAX_RATE: Decimal = dec!(1000000);

/// A tax schedule or rate table that breaks its own invariants.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("{schedule}: no tiers configured")]
    NoTiers { schedule: String },
    #[error("{schedule}: tier {index} threshold {threshold} does not exceed the previous threshold")]
    NonIncreasingThreshold {
        schedule: String,
        index: usize,
        threshold: Decimal,
    },
    #[error("{schedule}: only the last tier may be unbounded (tier {index})")]
    UnboundedTierNotLast { schedule: String, index: usize },
    #[error("{schedule}: tier {index} has negative rate {rate}")]
    NegativeRate {
        schedule: String,
        index: usize,
        rate: Decimal,
    },
    #[error("{schedule}: negative allowance {allowance}")]
    NegativeAllowance { schedule: String, allowance: Decimal },
    #[error("{schedule}: expected {expected} band rates (one per income tax tier), found {found}")]
    BandRateCount {
        schedule: String,
        expected: usize,
        found: usize,
    },
    #[error("{schedule}: {field} must not be negative, found {value}")]
    NegativeValue {
        schedule: String,
        field: &'static str,
        value: Decimal,
    },
    #[error("{schedule}: clawback span must be positive, found {span}")]
    NonPositiveClawbackSpan { schedule: String, span: Decimal },
    #[error("{schedule}: {field} {value} is outside the supported range")]
    OutOfRange {
        schedule: String,
        field: &'static str,
        value: Decimal,
    },
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum EvaluateError {
    #[error("cannot evaluate amount {0}: outside the supported range")]
    InvalidAmount(Decimal),
    #[error("arithmetic overflow evaluating {0}")]
    Overflow(String),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// One marginal band. `upper` is measured from the end of the allowance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Tier {
    /// Upper threshold of the tier; omitted for an unbounded top tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<f64>")]
    pub upper: Option<Decimal>,
    /// Marginal rate applied within the tier (0.20 = 20%)
    #[schemars(with = "f64")]
    pub rate: Decimal,
}

impl Tier {
    pub fn new(upper: Decimal, rate: Decimal) -> Self {
        Tier {
            upper: Some(upper),
            rate,
        }
    }

    pub fn unbounded(rate: Decimal) -> Self {
        Tier { upper: None, rate }
    }
}

/// Progressive schedule: an allowance followed by ordered marginal tiers.
///
/// Amounts above the top tier's threshold are taxed at the top rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaxBracketSchedule {
    /// Name used in error messages and logs
    #[serde(default)]
    pub label: String,
    /// Amount exempted before any tier applies
    #[serde(default)]
    #[schemars(with = "f64")]
    pub allowance: Decimal,
    pub tiers: Vec<Tier>,
}

impl TaxBracketSchedule {
    pub fn new(label: impl Into<String>, allowance: Decimal, tiers: Vec<Tier>) -> Self {
        TaxBracketSchedule {
            label: label.into(),
            allowance,
            tiers,
        }
    }

    fn name(&self) -> String {
        if self.label.is_empty() {
            "schedule".to_string()
        } else {
            self.label.clone()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.tiers.is_empty() {
            return Err(ConfigurationError::NoTiers {
                schedule: self.name(),
            });
        }
        if self.allowance < Decimal::ZERO {
            return Err(ConfigurationError::NegativeAllowance {
                schedule: self.name(),
                allowance: self.allowance,
            });
        }
        if self.allowance > MAX_AMOUNT {
            return Err(ConfigurationError::OutOfRange {
                schedule: self.name(),
                field: "allowance",
                value: self.allowance,
            });
        }

        let last = self.tiers.len() - 1;
        let mut previous = Decimal::ZERO;
        for (index, tier) in self.tiers.iter().enumerate() {
            if tier.rate < Decimal::ZERO {
                return Err(ConfigurationError::NegativeRate {
                    schedule: self.name(),
                    index,
                    rate: tier.rate,
                });
            }
            if tier.rate > MAX_RATE {
                return Err(ConfigurationError::OutOfRange {
                    schedule: self.name(),
                    field: "rate",
                    value: tier.rate,
                });
            }
            match tier.upper {
                Some(threshold) if threshold > MAX_AMOUNT => {
                    return Err(ConfigurationError::OutOfRange {
                        schedule: self.name(),
                        field: "threshold",
                        value: threshold,
                    });
                }
                Some(threshold) if threshold <= previous => {
                    return Err(ConfigurationError::NonIncreasingThreshold {
                        schedule: self.name(),
                        index,
                        threshold,
                    });
                }
                Some(threshold) => previous = threshold,
                None if index != last => {
                    return Err(ConfigurationError::UnboundedTierNotLast {
                        schedule: self.name(),
                        index,
                    });
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Progressive tax on `amount`.
    pub fn evaluate(&self, amount: Decimal) -> Result<Decimal, EvaluateError> {
        if amount < Decimal::ZERO || amount > MAX_AMOUNT {
            return Err(EvaluateError::InvalidAmount(amount));
        }
        self.validate()?;

        let taxable = (amount - self.allowance).max(Decimal::ZERO);
        let last = self.tiers.len() - 1;
        let mut tax = Decimal::ZERO;
        let mut floor = Decimal::ZERO;

        for (index, tier) in self.tiers.iter().enumerate() {
            // The top tier's own threshold does not cap it
            let ceiling = if index == last { None } else { tier.upper };
            let top = ceiling.map_or(taxable, |c| taxable.min(c));
            if top > floor {
                tax = (top - floor)
                    .checked_mul(tier.rate)
                    .and_then(|due| tax.checked_add(due))
                    .ok_or_else(|| EvaluateError::Overflow(self.name()))?;
            }
            match ceiling {
                Some(c) if taxable > c => floor = c,
                _ => break,
            }
        }

        Ok(tax)
    }

    /// Index of the tier holding the last taxable unit of `amount`; 0 when nothing is taxable.
    pub fn band_of(&self, amount: Decimal) -> usize {
        let taxable = (amount - self.allowance).max(Decimal::ZERO);
        let last = self.tiers.len().saturating_sub(1);
        self.tiers
            .iter()
            .position(|tier| tier.upper.is_none_or(|upper| taxable <= upper))
            .unwrap_or(last)
            .min(last)
    }
}
