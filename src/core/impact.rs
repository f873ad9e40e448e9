use super::baseline::{compute_baseline, BaselineResult};
use super::config::TaxConfig;
use super::profile::{TaxpayerProfile, ValidationError};
use super::scenario::{apply_scenario, Category, CategoryDeltas, PolicyScenario, TaxBenefit};
use super::schedule::{ConfigurationError, EvaluateError};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ImpactError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// Amount outside the supported range, or an overflowing result
    #[error(transparent)]
    Arithmetic(EvaluateError),
}

impl From<EvaluateError> for ImpactError {
    fn from(err: EvaluateError) -> Self {
        match err {
            EvaluateError::Configuration(err) => ImpactError::Configuration(err),
            other => ImpactError::Arithmetic(other),
        }
    }
}

/// Outcome of one scenario for one profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    pub name: String,
    pub title: String,
    /// Whole currency units; positive means the taxpayer is better off
    pub net_change: Decimal,
    /// Money gained (positive) or lost (negative) per category
    pub detailed_breakdown: BTreeMap<Category, Decimal>,
    pub tax_benefits: Vec<TaxBenefit>,
}

impl ImpactReport {
    fn assemble(scenario: &PolicyScenario, deltas: &CategoryDeltas) -> Self {
        let detailed_breakdown: BTreeMap<Category, Decimal> = Category::ALL
            .into_iter()
            .map(|category| (category, deltas.in_taxpayer_favour(category).normalize()))
            .collect();
        let net_change = (-deltas.liability_change())
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .normalize();

        ImpactReport {
            name: scenario.name.clone(),
            title: scenario.title.clone(),
            net_change,
            detailed_breakdown,
            tax_benefits: scenario.tax_benefits.clone(),
        }
    }

    /// Unrounded sum of the breakdown
    pub fn breakdown_total(&self) -> Decimal {
        self.detailed_breakdown.values().copied().sum()
    }

    pub fn is_better_off(&self) -> bool {
        self.net_change > Decimal::ZERO
    }
}

/// Reports for each scenario, in the order given.
///
/// Profile, configuration and every scenario are checked before anything is
/// evaluated, so either all reports are returned or none.
pub fn compute_impacts(
    profile: &TaxpayerProfile,
    scenarios: &[PolicyScenario],
    config: &TaxConfig,
) -> Result<Vec<ImpactReport>, ImpactError> {
    compute_impacts_with_baseline(profile, scenarios, config).map(|(_, reports)| reports)
}

/// Like [`compute_impacts`], also returning the baseline the reports were measured against.
pub fn compute_impacts_with_baseline(
    profile: &TaxpayerProfile,
    scenarios: &[PolicyScenario],
    config: &TaxConfig,
) -> Result<(BaselineResult, Vec<ImpactReport>), ImpactError> {
    profile.validate()?;
    config.validate()?;
    for scenario in scenarios {
        scenario.validate()?;
    }

    let baseline = compute_baseline(profile, config)?;

    let reports = scenarios
        .iter()
        .map(|scenario| -> Result<ImpactReport, ImpactError> {
            let deltas = apply_scenario(profile, &baseline, scenario)?;
            let report = ImpactReport::assemble(scenario, &deltas);
            log::debug!("Scenario {}: net change {}", report.name, report.net_change);
            Ok(report)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((baseline, reports))
}
