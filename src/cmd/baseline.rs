//! Baseline command - reference liability before any scenario

use super::impact::print_baseline;
use super::{read_profile, RatesArgs};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use taxdelta::core::{compute_baseline, BaselineResult, TaxpayerProfile};

#[derive(Args, Debug)]
pub struct BaselineCommand {
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
struct BaselineOutput<'a> {
    tax_year: String,
    #[serde(flatten)]
    baseline: &'a BaselineResult,
    net_liability: String,
}

impl BaselineCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let profile = TaxpayerProfile::try_from(&read_profile(&self.profile)?)?;
        let config = self.rates.load_config()?;
        let baseline = compute_baseline(&profile, &config)?;

        if self.json {
            let output = BaselineOutput {
                tax_year: config.tax_year.display(),
                baseline: &baseline,
                net_liability: format!("{:.2}", baseline.net_liability()),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_baseline(&baseline, &config.tax_year.display());
        }
        Ok(())
    }
}
