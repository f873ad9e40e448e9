//! Presets command - list bundled rate tables

use clap::Args;
use tabled::{settings::Style, Table, Tabled};
use taxdelta::core::{Preset, TaxYear};

#[derive(Args, Debug)]
pub struct PresetsCommand {}

#[derive(Tabled)]
struct PresetRow {
    #[tabled(rename = "Tax Year")]
    year: String,
    #[tabled(rename = "Period")]
    period: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Default")]
    default: String,
}

impl PresetsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let default = Preset::latest_for(TaxYear::current()).map(|p| p.tax_year);

        let rows = Preset::all()
            .iter()
            .map(|preset| {
                let config = preset.load()?;
                let year = preset.tax_year;
                let period = match (year.start_date(), year.end_date()) {
                    (Some(start), Some(end)) => format!("{} to {}", start, end),
                    _ => String::new(),
                };
                Ok(PresetRow {
                    year: year.display(),
                    period,
                    description: config.description.unwrap_or_default(),
                    default: if Some(year) == default { "*".to_string() } else { String::new() },
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        println!("{}", Table::new(rows).with(Style::rounded()));
        Ok(())
    }
}
