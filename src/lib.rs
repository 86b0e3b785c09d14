pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::resolver::RateProvider;
use crate::core::storage::Storage;
use anyhow::Result;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum ListCommand {
    Show,
    Available,
    Add { code: String },
    Remove { code: String },
    Reorder { codes: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Rates {
        refresh: bool,
        all: bool,
    },
    Convert {
        amount: String,
        from: String,
        to: Vec<String>,
    },
    Calc {
        from: String,
        keys: String,
    },
    List(ListCommand),
    Last,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("denominations starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let storage = Storage::new(store::open_store(&config));
    let rates = RateProvider::from_config(&config, storage.clone())?;
    execute(command, &config, &storage, &rates).await
}

/// Runs `command` against already constructed storage and rate provider.
pub async fn execute(
    command: AppCommand,
    config: &AppConfig,
    storage: &Storage,
    rates: &RateProvider,
) -> Result<()> {
    let base = config.base_currency.as_str();
    match command {
        AppCommand::Rates { refresh, all } => cli::rates::run(rates, storage, base, refresh, all).await,
        AppCommand::Convert { amount, from, to } => {
            cli::convert::run(rates, storage, base, &amount, &from, &to).await
        }
        AppCommand::Calc { from, keys } => cli::calc::run(rates, storage, base, &from, &keys).await,
        AppCommand::List(list) => match list {
            ListCommand::Show => cli::list::show(storage).await,
            ListCommand::Available => cli::list::available(),
            ListCommand::Add { code } => cli::list::add(storage, &code).await,
            ListCommand::Remove { code } => cli::list::remove(storage, &code).await,
            ListCommand::Reorder { codes } => cli::list::reorder(storage, &codes).await,
        },
        AppCommand::Last => cli::convert::show_last(storage).await,
    }
}
