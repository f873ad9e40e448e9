//! Batch command - net change for every profile in a CSV file

use super::RatesArgs;
use anyhow::Context;
use clap::Args;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use taxdelta::core::{
    compute_impacts, Category, ImpactReport, PolicyScenario, ProfileInput, TaxConfig,
    TaxpayerProfile,
};

#[derive(Args, Debug)]
pub struct BatchCommand {
    /// CSV file of profiles, one per row (or "-" for stdin); see `schema csv-fields`
    #[arg(short = 'i', long)]
    profiles: PathBuf,

    #[command(flatten)]
    rates: RatesArgs,

    /// Write results here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// One output line per profile and scenario
#[derive(Debug, Serialize)]
struct BatchRow {
    row: usize,
    scenario: String,
    net_change: String,
    income_tax: String,
    national_insurance: String,
    dividend_tax: String,
    capital_gains_tax: String,
    dependent_benefit: String,
}

impl BatchRow {
    fn new(row: usize, report: &ImpactReport) -> Self {
        let cell = |category: Category| {
            report
                .detailed_breakdown
                .get(&category)
                .map_or_else(String::new, |amount| format!("{:.2}", amount))
        };
        BatchRow {
            row,
            scenario: report.name.clone(),
            net_change: report.net_change.to_string(),
            income_tax: cell(Category::IncomeTax),
            national_insurance: cell(Category::NationalInsurance),
            dividend_tax: cell(Category::DividendTax),
            capital_gains_tax: cell(Category::CapitalGains),
            dependent_benefit: cell(Category::DependentBenefit),
        }
    }
}

impl BatchCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let config = self.rates.load_config()?;
        let scenarios = self.rates.load_scenarios()?;

        let input: Box<dyn Read> = if self.profiles.as_os_str() == "-" {
            Box::new(io::stdin().lock())
        } else {
            Box::new(
                File::open(&self.profiles)
                    .with_context(|| format!("cannot open {}", self.profiles.display()))?,
            )
        };
        let output: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(
                File::create(path).with_context(|| format!("cannot create {}", path.display()))?,
            ),
            None => Box::new(io::stdout()),
        };

        let summary = run_batch(input, output, &scenarios, &config)?;
        log::info!(
            "Processed {} profile(s), skipped {}",
            summary.processed,
            summary.skipped
        );
        if summary.skipped > 0 {
            anyhow::bail!("{} invalid profile row(s) skipped", summary.skipped);
        }
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct BatchSummary {
    processed: usize,
    skipped: usize,
}

fn run_batch<R: Read, W: Write>(
    input: R,
    output: W,
    scenarios: &[PolicyScenario],
    config: &TaxConfig,
) -> anyhow::Result<BatchSummary> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let mut wtr = csv::Writer::from_writer(output);
    let mut summary = BatchSummary::default();

    for (index, record) in rdr.deserialize::<ProfileInput>().enumerate() {
        // Header is line 1
        let row = index + 2;
        let profile = match record {
            Ok(input) => TaxpayerProfile::try_from(&input).map_err(anyhow::Error::from),
            Err(err) => Err(anyhow::Error::from(err)),
        };
        let profile = match profile {
            Ok(profile) => profile,
            Err(err) => {
                log::warn!("Row {}: {}", row, err);
                summary.skipped += 1;
                continue;
            }
        };

        for report in compute_impacts(&profile, scenarios, config)? {
            wtr.serialize(BatchRow::new(row, &report))?;
        }
        summary.processed += 1;
    }

    wtr.flush()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use taxdelta::core::{DeltaRule, Preset, TaxYear};

    fn config() -> TaxConfig {
        Preset::find(TaxYear(2024)).unwrap().load().unwrap()
    }

    #[test]
    fn rows_per_profile_and_scenario() {
        let csv = "filingStatus,annualIncome,dividends,capitalGains,age,dependents\n\
                   single,60000,0,0,40,2\n\
                   married,30000,500,0,35,0\n";
        let scenarios = vec![
            PolicyScenario::new("Cut", "")
                .with_rule(Category::IncomeTax, DeltaRule::rate(dec!(-0.01))),
            PolicyScenario::new("Same", ""),
        ];
        let mut out = Vec::new();
        let summary = run_batch(csv.as_bytes(), &mut out, &scenarios, &config()).unwrap();
        assert_eq!(
            summary,
            BatchSummary {
                processed: 2,
                skipped: 0
            }
        );

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "row,scenario,net_change,income_tax,national_insurance,dividend_tax,capital_gains_tax,dependent_benefit"
        );
        assert_eq!(lines[1], "2,Cut,600,600.00,0.00,0.00,0.00,0.00");
        assert_eq!(lines[2], "2,Same,0,0.00,0.00,0.00,0.00,0.00");
        assert_eq!(lines[3], "3,Cut,300,300.00,0.00,0.00,0.00,0.00");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn invalid_rows_are_skipped() {
        let csv = "filingStatus,annualIncome,dividends,capitalGains,age,dependents\n\
                   single,-100,0,0,40,2\n\
                   single,,0,0,40,2\n\
                   single,20000,0,0,40,1\n";
        let mut out = Vec::new();
        let summary =
            run_batch(csv.as_bytes(), &mut out, &[PolicyScenario::new("A", "")], &config())
                .unwrap();
        assert_eq!(
            summary,
            BatchSummary {
                processed: 1,
                skipped: 2
            }
        );
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\n4,A,0,"));
    }
}
