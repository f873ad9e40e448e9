//! Schema command - print expected input formats

use clap::Args;
use schemars::schema_for;
use taxdelta::core::{ProfileInput, ScenarioSet, TaxConfig};

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for a taxpayer profile
    JsonSchema,
    /// JSON Schema for rate tables passed with --config
    Config,
    /// JSON Schema for scenario lists passed with --scenarios
    Scenarios,
    /// CSV header row for the batch command
    CsvHeader,
    /// CSV column descriptions
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => {
                println!("{}", serde_json::to_string_pretty(&schema_for!(ProfileInput))?)
            }
            SchemaFormat::Config => {
                println!("{}", serde_json::to_string_pretty(&schema_for!(TaxConfig))?)
            }
            SchemaFormat::Scenarios => {
                println!("{}", serde_json::to_string_pretty(&schema_for!(ScenarioSet))?)
            }
            SchemaFormat::CsvHeader => println!("{}", ProfileInput::csv_header()),
            SchemaFormat::CsvFields => print_csv_fields(),
        }
        Ok(())
    }
}

fn print_csv_fields() {
    println!("CSV Input Format");
    println!("================");
    println!();
    for field in ProfileInput::csv_schema() {
        let req = if field.required { "required" } else { "optional" };
        match field.example {
            Some(example) => println!(
                "{:16} ({:8})  {} (e.g. {})",
                field.name, req, field.description, example
            ),
            None => println!("{:16} ({:8})  {}", field.name, req, field.description),
        }
    }
    println!();
    println!("Amounts are plain decimals in pounds; age and dependents are whole numbers");
}
