use adaconv::core::convert::Direction;
use adaconv::core::log::init_logging;
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Unit {
    /// The fiat currency
    #[value(alias = "cad")]
    Fiat,
    /// The crypto asset
    #[value(alias = "ada")]
    Asset,
}

impl From<Unit> for Direction {
    fn from(unit: Unit) -> Direction {
        match unit {
            Unit::Fiat => Direction::FiatToAsset,
            Unit::Asset => Direction::AssetToFiat,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch and display the current price
    Price,
    /// Convert an amount at the current price
    Convert {
        /// Amount to convert, missing means zero
        amount: Option<String>,
        /// Unit of the amount
        #[arg(short, long, value_enum, default_value = "fiat")]
        from: Unit,
    },
    /// Keep the price fresh and convert interactively (default)
    Watch,
}

impl From<Commands> for adaconv::AppCommand {
    fn from(cmd: Commands) -> adaconv::AppCommand {
        match cmd {
            Commands::Price => adaconv::AppCommand::Price,
            Commands::Convert { amount, from } => adaconv::AppCommand::Convert {
                amount: amount.unwrap_or_default(),
                direction: from.into(),
            },
            Commands::Watch => adaconv::AppCommand::Watch,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => adaconv::cli::setup::setup(),
        Some(cmd) => adaconv::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => adaconv::run_command(adaconv::AppCommand::Watch, cli.config_path.as_deref()).await,
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
