use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use denominations::cli::setup::setup;
use denominations::core::log::init_logging;
use denominations::{AppCommand, ListCommand};

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

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show exchange rates for the saved currencies
    Rates {
        /// Ignore the cache and fetch fresh rates
        #[arg(short, long)]
        refresh: bool,
        /// Show every known currency
        #[arg(short, long)]
        all: bool,
    },
    /// Convert an amount into the saved currencies
    Convert {
        amount: String,
        from: String,
        /// Target currency; repeat for several. Defaults to the saved list.
        #[arg(short, long)]
        to: Vec<String>,
    },
    /// Evaluate calculator keys, then convert the result
    Calc {
        from: String,
        /// Key presses such as "12+3=" ('<' backspace, 'c' clear)
        keys: String,
    },
    /// Manage the saved currency list
    #[command(subcommand)]
    List(ListCommands),
    /// Show the last conversion
    Last,
}

#[derive(Subcommand)]
enum ListCommands {
    /// Show the saved currencies
    Show,
    /// Show every known currency
    Available,
    /// Save a currency
    Add { code: String },
    /// Remove a saved currency
    Remove { code: String },
    /// Replace the saved list with the given order
    Reorder {
        #[arg(required = true)]
        codes: Vec<String>,
    },
}

impl From<ListCommands> for ListCommand {
    fn from(cmd: ListCommands) -> ListCommand {
        match cmd {
            ListCommands::Show => ListCommand::Show,
            ListCommands::Available => ListCommand::Available,
            ListCommands::Add { code } => ListCommand::Add { code },
            ListCommands::Remove { code } => ListCommand::Remove { code },
            ListCommands::Reorder { codes } => ListCommand::Reorder { codes },
        }
    }
}

impl TryFrom<Commands> for AppCommand {
    type Error = anyhow::Error;

    fn try_from(cmd: Commands) -> Result<AppCommand> {
        Ok(match cmd {
            Commands::Rates { refresh, all } => AppCommand::Rates { refresh, all },
            Commands::Convert { amount, from, to } => AppCommand::Convert { amount, from, to },
            Commands::Calc { from, keys } => AppCommand::Calc { from, keys },
            Commands::List(list) => AppCommand::List(list.into()),
            Commands::Last => AppCommand::Last,
            Commands::Setup => anyhow::bail!("Setup command is handled separately"),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => match AppCommand::try_from(cmd) {
            Ok(command) => denominations::run_command(command, cli.config_path.as_deref()).await,
            Err(e) => Err(e),
        },
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
