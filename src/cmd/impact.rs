//! Impact command - net change for one profile under each scenario

use super::{format_amount, format_signed, read_profile, RatesArgs};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};
use taxdelta::core::{
    compute_impacts_with_baseline, BaselineResult, Category, ImpactReport, TaxpayerProfile,
};

#[derive(Args, Debug)]
pub struct ImpactCommand {
    /// JSON file containing the profile (or "-" for stdin)
    #[arg(short, long)]
    profile: PathBuf,

    #[command(flatten)]
    rates: RatesArgs,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImpactOutput<'a> {
    tax_year: String,
    profile: &'a TaxpayerProfile,
    baseline: &'a BaselineResult,
    reports: &'a [ImpactReport],
}

#[derive(Debug, Tabled)]
struct ReportRow {
    #[tabled(rename = "Scenario")]
    name: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Net Change")]
    net_change: String,
    #[tabled(rename = "Income Tax")]
    income_tax: String,
    #[tabled(rename = "NI")]
    national_insurance: String,
    #[tabled(rename = "Dividends")]
    dividend_tax: String,
    #[tabled(rename = "CGT")]
    capital_gains: String,
    #[tabled(rename = "Benefit")]
    dependent_benefit: String,
}

impl From<&ImpactReport> for ReportRow {
    fn from(report: &ImpactReport) -> Self {
        let cell = |category: Category| {
            report
                .detailed_breakdown
                .get(&category)
                .map_or_else(String::new, |amount| format_signed(*amount))
        };
        ReportRow {
            name: report.name.clone(),
            title: report.title.clone(),
            net_change: format_signed(report.net_change),
            income_tax: cell(Category::IncomeTax),
            national_insurance: cell(Category::NationalInsurance),
            dividend_tax: cell(Category::DividendTax),
            capital_gains: cell(Category::CapitalGains),
            dependent_benefit: cell(Category::DependentBenefit),
        }
    }
}

impl ImpactCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let input = read_profile(&self.profile)?;
        let profile = TaxpayerProfile::try_from(&input)?;
        let config = self.rates.load_config()?;
        let scenarios = self.rates.load_scenarios()?;

        let (baseline, reports) = compute_impacts_with_baseline(&profile, &scenarios, &config)?;
        log::info!(
            "Computed {} report(s) against {} baseline",
            reports.len(),
            config.tax_year
        );

        if self.json {
            let output = ImpactOutput {
                tax_year: config.tax_year.display(),
                profile: &profile,
                baseline: &baseline,
                reports: &reports,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_baseline(&baseline, &config.tax_year.display());
            print_reports(&reports);
        }
        Ok(())
    }
}

pub(crate) fn print_baseline(baseline: &BaselineResult, year: &str) {
    println!();
    println!("BASELINE ({})", year);
    println!("  Income Tax:         {}", format_amount(baseline.income_tax));
    println!("  National Insurance: {}", format_amount(baseline.nic));
    println!("  Dividend Tax:       {}", format_amount(baseline.dividend_tax));
    println!("  Capital Gains Tax:  {}", format_amount(baseline.capital_gains_tax));
    println!("  Dependent Benefit:  {}", format_amount(baseline.dependent_benefit));
    println!("  Net Liability:      {}", format_amount(baseline.net_liability()));
    println!();
}

fn print_reports(reports: &[ImpactReport]) {
    if reports.is_empty() {
        println!("No scenarios to compare");
        return;
    }

    let rows: Vec<ReportRow> = reports.iter().map(ReportRow::from).collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);

    for report in reports.iter().filter(|r| !r.tax_benefits.is_empty()) {
        println!();
        println!("{} - tax benefits", report.name);
        for benefit in &report.tax_benefits {
            match benefit.amount {
                Some(amount) => println!(
                    "  {} ({}): {}",
                    benefit.name,
                    format_signed(amount),
                    benefit.description
                ),
                None => println!("  {}: {}", benefit.name, benefit.description),
            }
        }
    }
    println!();
}
