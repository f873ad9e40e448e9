use super::config::TaxConfig;
use super::impact::ImpactError;
use super::profile::TaxpayerProfile;
use rust_decimal::Decimal;
use serde::Serialize;

/// Liabilities and benefit under the configured rules, before any scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineResult {
    /// Income tax tier the annual income reaches; selects dividend and CGT rates
    pub income_band: usize,
    pub income_tax: Decimal,
    pub nic: Decimal,
    pub dividend_tax: Decimal,
    pub capital_gains_tax: Decimal,
    pub dependent_benefit: Decimal,
}

impl BaselineResult {
    pub fn total_tax(&self) -> Decimal {
        self.income_tax + self.nic + self.dividend_tax + self.capital_gains_tax
    }

    /// Taxes owed less benefit received
    pub fn net_liability(&self) -> Decimal {
        self.total_tax() - self.dependent_benefit
    }
}

pub fn compute_baseline(
    profile: &TaxpayerProfile,
    config: &TaxConfig,
) -> Result<BaselineResult, ImpactError> {
    profile.validate()?;
    config.validate()?;

    let income = profile.annual_income;
    let income_band = config.income_tax.band_of(income);

    let income_tax = config.income_tax.evaluate(income)?;
    let nic = config.national_insurance.evaluate(income)?;
    let dividend_tax = config.dividends.tax_on(profile.dividends, income_band);
    let capital_gains_tax = config.capital_gains.tax_on(profile.capital_gains, income_band);
    let dependent_benefit = config
        .dependent_benefit
        .amount(profile.dependents, income);

    log::debug!(
        "Baseline {}: band={}, income_tax={}, nic={}, dividend_tax={}, cgt={}, benefit={}",
        config.tax_year,
        income_band,
        income_tax,
        nic,
        dividend_tax,
        capital_gains_tax,
        dependent_benefit
    );

    Ok(BaselineResult {
        income_band,
        income_tax,
        nic,
        dividend_tax,
        capital_gains_tax,
        dependent_benefit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Preset;
    use crate::core::profile::FilingStatus;
    use crate::core::uk::TaxYear;
    use rust_decimal_macros::dec;

    fn config() -> TaxConfig {
        Preset::find(TaxYear(2024)).unwrap().load().unwrap()
    }

    fn profile(income: Decimal, dividends: Decimal, gains: Decimal, dependents: u32) -> TaxpayerProfile {
        TaxpayerProfile {
            filing_status: FilingStatus::Single,
            annual_income: income,
            dividends,
            capital_gains: gains,
            age: 40,
            dependents,
        }
    }

    #[test]
    fn income_within_personal_allowance_pays_no_income_tax() {
        for income in [dec!(0), dec!(5000), dec!(12570)] {
            let baseline = compute_baseline(&profile(income, dec!(0), dec!(0), 0), &config()).unwrap();
            assert_eq!(baseline.income_tax, Decimal::ZERO);
            assert_eq!(baseline.nic, Decimal::ZERO);
        }
    }

    #[test]
    fn higher_rate_taxpayer() {
        let baseline =
            compute_baseline(&profile(dec!(60000), dec!(3000), dec!(10000), 0), &config()).unwrap();
        assert_eq!(baseline.income_band, 1);
        assert_eq!(baseline.income_tax, dec!(11432));
        // 37700 at 12% + 9730 at 2%
        assert_eq!(baseline.nic, dec!(4718.60));
        // 2000 above the allowance at the higher dividend rate
        assert_eq!(baseline.dividend_tax, dec!(675));
        // 4000 above the exemption at 20%
        assert_eq!(baseline.capital_gains_tax, dec!(800));
        assert_eq!(baseline.dependent_benefit, Decimal::ZERO);
        assert_eq!(baseline.net_liability(), dec!(17625.60));
    }

    #[test]
    fn dividend_rate_follows_income_band_not_dividend_size() {
        let config = config();
        let basic = compute_baseline(&profile(dec!(30000), dec!(3000), dec!(0), 0), &config).unwrap();
        let higher = compute_baseline(&profile(dec!(80000), dec!(3000), dec!(0), 0), &config).unwrap();
        assert_eq!(basic.dividend_tax, dec!(175));
        assert_eq!(higher.dividend_tax, dec!(675));

        let additional =
            compute_baseline(&profile(dec!(200000), dec!(0), dec!(16000), 0), &config).unwrap();
        assert_eq!(additional.income_band, 2);
        assert_eq!(additional.capital_gains_tax, dec!(2000));
    }

    #[test]
    fn benefit_paid_in_full_below_threshold() {
        let baseline = compute_baseline(&profile(dec!(40000), dec!(0), dec!(0), 2), &config()).unwrap();
        assert_eq!(baseline.dependent_benefit, dec!(2074.80));
    }

    #[test]
    fn benefit_partially_clawed_back() {
        let baseline = compute_baseline(&profile(dec!(57500), dec!(0), dec!(0), 1), &config()).unwrap();
        assert_eq!(baseline.dependent_benefit, dec!(312));
    }

    #[test]
    fn benefit_eliminated_at_clawback_upper_bound() {
        let config = config();
        let bound = config.dependent_benefit.upper_bound();
        let baseline = compute_baseline(&profile(bound, dec!(0), dec!(0), 3), &config).unwrap();
        assert_eq!(baseline.dependent_benefit, Decimal::ZERO);
    }

    #[test]
    fn negative_profile_amount_rejected() {
        let err = compute_baseline(&profile(dec!(-1), dec!(0), dec!(0), 0), &config()).unwrap_err();
        assert!(matches!(err, ImpactError::Validation(_)));
    }

    #[test]
    fn broken_config_rejected() {
        let mut config = config();
        config.capital_gains.rates.clear();
        let err = compute_baseline(&profile(dec!(1), dec!(0), dec!(0), 0), &config).unwrap_err();
        assert!(matches!(err, ImpactError::Configuration(_)));
    }
}
