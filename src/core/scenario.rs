use super::baseline::BaselineResult;
use super::profile::TaxpayerProfile;
use super::schedule::{
    ConfigurationError, EvaluateError, TaxBracketSchedule, MAX_AMOUNT, MAX_RATE,
};
use anyhow::Context;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Fixed reporting categories, in breakdown order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum Category {
    #[serde(rename = "Income Tax")]
    IncomeTax,
    #[serde(rename = "National Insurance")]
    NationalInsurance,
    #[serde(rename = "Dividend Tax")]
    DividendTax,
    #[serde(rename = "Capital Gains Tax")]
    CapitalGains,
    #[serde(rename = "Dependent Benefit")]
    DependentBenefit,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::IncomeTax,
        Category::NationalInsurance,
        Category::DividendTax,
        Category::CapitalGains,
        Category::DependentBenefit,
    ];

    pub fn display(&self) -> &'static str {
        match self {
            Category::IncomeTax => "Income Tax",
            Category::NationalInsurance => "National Insurance",
            Category::DividendTax => "Dividend Tax",
            Category::CapitalGains => "Capital Gains Tax",
            Category::DependentBenefit => "Dependent Benefit",
        }
    }

    /// Benefits are paid to the taxpayer; everything else is owed.
    pub fn is_benefit(self) -> bool {
        matches!(self, Category::DependentBenefit)
    }

    /// Profile amount a delta rule for this category is applied to
    pub fn input(self, profile: &TaxpayerProfile) -> Decimal {
        match self {
            Category::IncomeTax | Category::NationalInsurance => profile.annual_income,
            Category::DividendTax => profile.dividends,
            Category::CapitalGains => profile.capital_gains,
            Category::DependentBenefit => Decimal::from(profile.dependents),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

fn unit_scale() -> Decimal {
    dec!(1)
}

/// How a scenario moves one category away from the baseline.
///
/// Positive results add liability (or, for benefits, add benefit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeltaRule {
    /// `rate × amount`; a negative rate is a relief
    Rate {
        #[schemars(with = "f64")]
        rate: Decimal,
    },
    /// `scale × progressive tax on amount`
    Tiered {
        schedule: TaxBracketSchedule,
        #[serde(default = "unit_scale")]
        #[schemars(with = "f64")]
        scale: Decimal,
    },
}

impl DeltaRule {
    pub fn rate(rate: Decimal) -> Self {
        DeltaRule::Rate { rate }
    }

    /// Change produced on `amount`, which must lie between 0 and [`MAX_AMOUNT`].
    pub fn apply(&self, amount: Decimal) -> Result<Decimal, EvaluateError> {
        if amount < Decimal::ZERO || amount > MAX_AMOUNT {
            return Err(EvaluateError::InvalidAmount(amount));
        }
        let (factor, base) = match self {
            DeltaRule::Rate { rate } => (*rate, amount),
            DeltaRule::Tiered { schedule, scale } => (*scale, schedule.evaluate(amount)?),
        };
        factor
            .checked_mul(base)
            .ok_or_else(|| EvaluateError::Overflow("delta rule".to_string()))
    }

    /// Rates and scales are bounded by [`MAX_RATE`] in magnitude.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let (field, factor) = match self {
            DeltaRule::Rate { rate } => ("rate", *rate),
            DeltaRule::Tiered { schedule, scale } => {
                schedule.validate()?;
                ("scale", *scale)
            }
        };
        if factor.abs() > MAX_RATE {
            return Err(ConfigurationError::OutOfRange {
                schedule: "delta rule".to_string(),
                field,
                value: factor,
            });
        }
        Ok(())
    }
}

/// Descriptive note shown alongside a scenario; never part of the arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TaxBenefit {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<f64>")]
    pub amount: Option<Decimal>,
}

/// A named hypothetical regime. Missing rules leave the category unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyScenario {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_tax: Option<DeltaRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub national_insurance: Option<DeltaRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dividend_tax: Option<DeltaRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital_gains: Option<DeltaRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent_benefit: Option<DeltaRule>,
    #[serde(default)]
    pub tax_benefits: Vec<TaxBenefit>,
}

impl PolicyScenario {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        PolicyScenario {
            name: name.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_rule(mut self, category: Category, rule: DeltaRule) -> Self {
        *self.slot_mut(category) = Some(rule);
        self
    }

    pub fn with_benefit(mut self, benefit: TaxBenefit) -> Self {
        self.tax_benefits.push(benefit);
        self
    }

    pub fn rule(&self, category: Category) -> Option<&DeltaRule> {
        match category {
            Category::IncomeTax => self.income_tax.as_ref(),
            Category::NationalInsurance => self.national_insurance.as_ref(),
            Category::DividendTax => self.dividend_tax.as_ref(),
            Category::CapitalGains => self.capital_gains.as_ref(),
            Category::DependentBenefit => self.dependent_benefit.as_ref(),
        }
    }

    fn slot_mut(&mut self, category: Category) -> &mut Option<DeltaRule> {
        match category {
            Category::IncomeTax => &mut self.income_tax,
            Category::NationalInsurance => &mut self.national_insurance,
            Category::DividendTax => &mut self.dividend_tax,
            Category::CapitalGains => &mut self.capital_gains,
            Category::DependentBenefit => &mut self.dependent_benefit,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        Category::ALL
            .iter()
            .filter_map(|category| self.rule(*category))
            .try_for_each(DeltaRule::validate)
    }
}

/// Scenario list as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioSet {
    pub scenarios: Vec<PolicyScenario>,
}

impl ScenarioSet {
    pub fn from_reader<R: Read>(reader: R) -> anyhow::Result<ScenarioSet> {
        let set: ScenarioSet =
            serde_json::from_reader(reader).context("failed to parse scenarios")?;
        for scenario in &set.scenarios {
            scenario
                .validate()
                .with_context(|| format!("scenario '{}'", scenario.name))?;
        }
        Ok(set)
    }

    /// Scenarios shipped with the binary
    pub fn bundled() -> anyhow::Result<ScenarioSet> {
        Self::from_reader(include_str!("../../presets/scenarios.json").as_bytes())
    }
}

/// Change per category, each in its own sign convention:
/// taxes are changes in liability, the benefit is a change in benefit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryDeltas {
    pub income_tax: Decimal,
    pub national_insurance: Decimal,
    pub dividend_tax: Decimal,
    pub capital_gains: Decimal,
    pub dependent_benefit: Decimal,
}

impl CategoryDeltas {
    pub fn get(&self, category: Category) -> Decimal {
        match category {
            Category::IncomeTax => self.income_tax,
            Category::NationalInsurance => self.national_insurance,
            Category::DividendTax => self.dividend_tax,
            Category::CapitalGains => self.capital_gains,
            Category::DependentBenefit => self.dependent_benefit,
        }
    }

    fn set(&mut self, category: Category, delta: Decimal) {
        match category {
            Category::IncomeTax => self.income_tax = delta,
            Category::NationalInsurance => self.national_insurance = delta,
            Category::DividendTax => self.dividend_tax = delta,
            Category::CapitalGains => self.capital_gains = delta,
            Category::DependentBenefit => self.dependent_benefit = delta,
        }
    }

    /// Money gained by the taxpayer in `category`
    pub fn in_taxpayer_favour(&self, category: Category) -> Decimal {
        let delta = self.get(category);
        if category.is_benefit() {
            delta
        } else {
            -delta
        }
    }

    /// Overall change in what the taxpayer owes, net of benefit
    pub fn liability_change(&self) -> Decimal {
        self.income_tax + self.national_insurance + self.dividend_tax + self.capital_gains
            - self.dependent_benefit
    }
}

fn baseline_amount(baseline: &BaselineResult, category: Category) -> Decimal {
    match category {
        Category::IncomeTax => baseline.income_tax,
        Category::NationalInsurance => baseline.nic,
        Category::DividendTax => baseline.dividend_tax,
        Category::CapitalGains => baseline.capital_gains_tax,
        Category::DependentBenefit => baseline.dependent_benefit,
    }
}

/// Evaluate each of the scenario's rules against the profile.
///
/// Rules are validated first. Results are not clamped: a relief may exceed
/// the baseline amount.
pub fn apply_scenario(
    profile: &TaxpayerProfile,
    baseline: &BaselineResult,
    scenario: &PolicyScenario,
) -> Result<CategoryDeltas, EvaluateError> {
    scenario.validate()?;
    let mut deltas = CategoryDeltas::default();
    for category in Category::ALL {
        let Some(rule) = scenario.rule(category) else {
            continue;
        };
        let delta = rule.apply(category.input(profile))?;
        log::debug!(
            "Scenario {} {}: baseline {}, change {:+}",
            scenario.name,
            category,
            baseline_amount(baseline, category),
            delta
        );
        deltas.set(category, delta);
    }
    Ok(deltas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::profile::FilingStatus;
    use crate::core::schedule::Tier;

    fn profile(dependents: u32) -> TaxpayerProfile {
        TaxpayerProfile {
            filing_status: FilingStatus::Married,
            annual_income: dec!(60000),
            dividends: dec!(2000),
            capital_gains: dec!(8000),
            age: 52,
            dependents,
        }
    }

    fn baseline() -> BaselineResult {
        BaselineResult {
            income_band: 1,
            income_tax: dec!(11432),
            nic: dec!(4718.60),
            dividend_tax: dec!(337.50),
            capital_gains_tax: dec!(400),
            dependent_benefit: Decimal::ZERO,
        }
    }

    #[test]
    fn absent_rules_are_zero() {
        let deltas = apply_scenario(&profile(2), &baseline(), &PolicyScenario::new("Nobody", "")).unwrap();
        assert_eq!(deltas, CategoryDeltas::default());
        assert_eq!(deltas.liability_change(), Decimal::ZERO);
    }

    #[test]
    fn each_rule_sees_its_own_profile_amount() {
        let scenario = PolicyScenario::new("All", "")
            .with_rule(Category::IncomeTax, DeltaRule::rate(dec!(-0.01)))
            .with_rule(Category::NationalInsurance, DeltaRule::rate(dec!(0.01)))
            .with_rule(Category::DividendTax, DeltaRule::rate(dec!(-0.05)))
            .with_rule(Category::CapitalGains, DeltaRule::rate(dec!(0.10)))
            .with_rule(Category::DependentBenefit, DeltaRule::rate(dec!(500)));

        let deltas = apply_scenario(&profile(2), &baseline(), &scenario).unwrap();
        assert_eq!(deltas.income_tax, dec!(-600));
        assert_eq!(deltas.national_insurance, dec!(600));
        assert_eq!(deltas.dividend_tax, dec!(-100));
        assert_eq!(deltas.capital_gains, dec!(800));
        assert_eq!(deltas.dependent_benefit, dec!(1000));
        // -600 + 600 - 100 + 800 - 1000
        assert_eq!(deltas.liability_change(), dec!(-300));
        assert_eq!(deltas.in_taxpayer_favour(Category::IncomeTax), dec!(600));
        assert_eq!(deltas.in_taxpayer_favour(Category::DependentBenefit), dec!(1000));
    }

    #[test]
    fn no_dependents_means_no_benefit_delta() {
        let scenario = PolicyScenario::new("Families", "")
            .with_rule(Category::DependentBenefit, DeltaRule::rate(dec!(500)));
        let deltas = apply_scenario(&profile(0), &baseline(), &scenario).unwrap();
        assert_eq!(deltas.dependent_benefit, Decimal::ZERO);
    }

    #[test]
    fn relief_may_exceed_baseline() {
        let scenario = PolicyScenario::new("Generous", "")
            .with_rule(Category::CapitalGains, DeltaRule::rate(dec!(-1)));
        let deltas = apply_scenario(&profile(0), &baseline(), &scenario).unwrap();
        assert_eq!(deltas.capital_gains, dec!(-8000));
        assert!(baseline().capital_gains_tax + deltas.capital_gains < Decimal::ZERO);
    }

    #[test]
    fn tiered_rule_adds_a_surcharge_band() {
        let surcharge = TaxBracketSchedule::new(
            "surcharge",
            dec!(50000),
            vec![Tier::unbounded(dec!(0.05))],
        );
        let scenario = PolicyScenario::new("Surcharge", "").with_rule(
            Category::IncomeTax,
            DeltaRule::Tiered {
                schedule: surcharge,
                scale: dec!(1),
            },
        );
        let deltas = apply_scenario(&profile(0), &baseline(), &scenario).unwrap();
        assert_eq!(deltas.income_tax, dec!(500));
    }

    #[test]
    fn invalid_tiered_rule_rejected() {
        let scenario = PolicyScenario::new("Broken", "").with_rule(
            Category::NationalInsurance,
            DeltaRule::Tiered {
                schedule: TaxBracketSchedule::new("broken", Decimal::ZERO, vec![]),
                scale: dec!(1),
            },
        );
        assert!(matches!(scenario.validate(), Err(ConfigurationError::NoTiers { .. })));
        assert!(apply_scenario(&profile(0), &baseline(), &scenario).is_err());
    }

    #[test]
    fn oversized_rates_and_scales_rejected() {
        let steep = PolicyScenario::new("Steep", "")
            .with_rule(Category::IncomeTax, DeltaRule::rate(dec!(-2000000)));
        assert!(matches!(
            steep.validate(),
            Err(ConfigurationError::OutOfRange { field: "rate", .. })
        ));
        assert!(matches!(
            apply_scenario(&profile(0), &baseline(), &steep),
            Err(EvaluateError::Configuration(_))
        ));

        let scaled = PolicyScenario::new("Scaled", "").with_rule(
            Category::CapitalGains,
            DeltaRule::Tiered {
                schedule: TaxBracketSchedule::new(
                    "cgt",
                    Decimal::ZERO,
                    vec![Tier::unbounded(dec!(0.1))],
                ),
                scale: MAX_RATE * dec!(10),
            },
        );
        assert!(matches!(
            scaled.validate(),
            Err(ConfigurationError::OutOfRange { field: "scale", .. })
        ));
    }

    #[test]
    fn rule_rejects_amounts_outside_supported_range() {
        let rule = DeltaRule::rate(dec!(0.5));
        let huge = dec!(70000000000000000000000000000);
        assert_eq!(rule.apply(huge), Err(EvaluateError::InvalidAmount(huge)));
        assert_eq!(rule.apply(dec!(-1)), Err(EvaluateError::InvalidAmount(dec!(-1))));

        let mut rich = profile(0);
        rich.annual_income = huge;
        let scenario = PolicyScenario::new("Half", "").with_rule(Category::IncomeTax, rule);
        assert_eq!(
            apply_scenario(&rich, &baseline(), &scenario),
            Err(EvaluateError::InvalidAmount(huge))
        );
    }

    #[test]
    fn unchecked_rule_overflow_is_an_error() {
        let rule = DeltaRule::Rate { rate: Decimal::MAX };
        assert!(matches!(rule.apply(MAX_AMOUNT), Err(EvaluateError::Overflow(_))));
    }

    #[test]
    fn bundled_benefit_notes_match_rules() {
        let set = ScenarioSet::bundled().unwrap();
        for scenario in &set.scenarios {
            for benefit in &scenario.tax_benefits {
                assert_eq!(benefit.amount, None, "{}: {}", scenario.name, benefit.name);
            }
        }

        let truss = &set.scenarios[1];
        assert_eq!(truss.rule(Category::DividendTax), Some(&DeltaRule::rate(dec!(-0.05))));
        assert!(truss.tax_benefits[0].description.contains("5% of dividends"));

        let johnson = &set.scenarios[2];
        assert_eq!(johnson.rule(Category::DependentBenefit), Some(&DeltaRule::rate(dec!(500))));
        assert!(johnson.tax_benefits[0].description.contains("£500 per dependent"));
    }

    #[test]
    fn scenarios_parse_from_json() {
        let set = ScenarioSet::from_reader(
            r#"{"scenarios":[{"name":"A","title":"t",
                "incomeTax":{"kind":"rate","rate":-0.01},
                "capitalGains":{"kind":"tiered","schedule":{"allowance":1000,"tiers":[{"rate":0.1}]},"scale":-1}
            }]}"#
                .as_bytes(),
        )
        .unwrap();
        let scenario = &set.scenarios[0];
        assert_eq!(scenario.rule(Category::IncomeTax), Some(&DeltaRule::rate(dec!(-0.01))));
        assert!(scenario.rule(Category::NationalInsurance).is_none());
        let cgt = scenario.rule(Category::CapitalGains).unwrap();
        assert_eq!(cgt.apply(dec!(3000)).unwrap(), dec!(-200));
    }

    #[test]
    fn bundled_scenarios_load() {
        let set = ScenarioSet::bundled().unwrap();
        let names: Vec<_> = set.scenarios.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Rishi Sunak", "Liz Truss", "Boris Johnson"]);
    }

    #[test]
    fn category_names_serialize_as_labels() {
        assert_eq!(
            serde_json::to_string(&Category::CapitalGains).unwrap(),
            "\"Capital Gains Tax\""
        );
        for category in Category::ALL {
            assert_eq!(
                serde_json::to_string(&category).unwrap(),
                format!("\"{}\"", category.display())
            );
        }
    }
}
