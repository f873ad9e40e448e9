use clap::{Parser, Subcommand};

mod cmd;

#[derive(Parser, Debug)]
#[command(
    name = "taxdelta",
    version,
    about = "Compare your tax position under different policy scenarios"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Net change for one profile under each scenario
    Impact(cmd::impact::ImpactCommand),
    /// Baseline liability for one profile
    Baseline(cmd::baseline::BaselineCommand),
    /// Net change for every profile in a CSV file
    Batch(cmd::batch::BatchCommand),
    /// Print expected input formats
    Schema(cmd::schema::SchemaCommand),
    /// List bundled tax year presets
    Presets(cmd::presets::PresetsCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Impact(cmd) => cmd.exec(),
        Command::Baseline(cmd) => cmd.exec(),
        Command::Batch(cmd) => cmd.exec(),
        Command::Schema(cmd) => cmd.exec(),
        Command::Presets(cmd) => cmd.exec(),
    }
}
