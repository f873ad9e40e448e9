pub mod baseline;
pub mod batch;
pub mod impact;
pub mod presets;
pub mod schema;

use anyhow::Context;
use clap::Args;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use taxdelta::core::{PolicyScenario, Preset, ProfileInput, ScenarioSet, TaxConfig, TaxYear};

/// Where the rate tables and scenarios come from
#[derive(Args, Debug)]
pub struct RatesArgs {
    /// JSON rate tables (see `schema config`); overrides --year
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bundled tax year preset, e.g. 2024 or 2023/24 (default: latest up to today)
    #[arg(short, long)]
    year: Option<String>,

    /// JSON scenario list (default: bundled scenarios)
    #[arg(short, long)]
    scenarios: Option<PathBuf>,
}

impl RatesArgs {
    pub fn load_config(&self) -> anyhow::Result<TaxConfig> {
        if let Some(path) = &self.config {
            let file = File::open(path)
                .with_context(|| format!("cannot open config {}", path.display()))?;
            let config = TaxConfig::from_reader(BufReader::new(file))?;
            log::info!("Loaded {} rate tables from {}", config.tax_year, path.display());
            return Ok(config);
        }

        let preset = match &self.year {
            Some(year) => {
                let year = TaxYear::parse(year)
                    .with_context(|| format!("invalid tax year '{year}'"))?;
                Preset::find(year).with_context(|| {
                    let known: Vec<_> = Preset::all().iter().map(|p| p.tax_year.display()).collect();
                    format!("no bundled preset for {year}; available: {}", known.join(", "))
                })?
            }
            None => {
                let current = TaxYear::current();
                let preset = Preset::latest_for(current).context("no bundled presets")?;
                if preset.tax_year != current {
                    log::warn!(
                        "No preset for {}, using {} rate tables",
                        current,
                        preset.tax_year
                    );
                }
                preset
            }
        };
        preset.load()
    }

    pub fn load_scenarios(&self) -> anyhow::Result<Vec<PolicyScenario>> {
        let set = match &self.scenarios {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("cannot open scenarios {}", path.display()))?;
                ScenarioSet::from_reader(BufReader::new(file))?
            }
            None => ScenarioSet::bundled()?,
        };
        log::info!("Loaded {} scenario(s)", set.scenarios.len());
        Ok(set.scenarios)
    }
}

/// Read a JSON profile from a file (or stdin with "-")
pub fn read_profile(path: &Path) -> anyhow::Result<ProfileInput> {
    let mut buffer = Vec::new();
    if path.as_os_str() == "-" {
        io::stdin().lock().read_to_end(&mut buffer)?;
        if buffer.is_empty() {
            anyhow::bail!("No input received. Provide a file or pipe a profile to stdin.");
        }
    } else {
        File::open(path)
            .with_context(|| format!("cannot open profile {}", path.display()))?
            .read_to_end(&mut buffer)?;
    }
    serde_json::from_slice(&buffer).context("failed to parse profile")
}

pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

pub fn format_signed(amount: Decimal) -> String {
    if amount > Decimal::ZERO {
        format!("+{:.2}", amount)
    } else {
        format!("{:.2}", amount)
    }
}
