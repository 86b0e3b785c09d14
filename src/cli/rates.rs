use super::ui;
use crate::core::conversion::format_amount;
use crate::core::currency::{self, CURRENCIES};
use crate::core::resolver::{RateProvider, Resolved};
use crate::core::storage::Storage;
use crate::core::watchlist::Watchlist;
use anyhow::Result;
use comfy_table::Cell;

pub fn render_rates(resolved: &Resolved, codes: &[String]) -> String {
    let base = &resolved.table.base;
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Name"),
        ui::header_cell(&format!("Rate (1 {base})")),
    ]);

    for code in codes {
        table.add_row(vec![
            Cell::new(code),
            Cell::new(currency::find(code).map_or("", |d| d.name)),
            ui::format_optional_cell(resolved.table.rate(code), format_amount),
        ]);
    }

    format!(
        "Exchange rates: {}\n\n{}\n{}",
        ui::style_text(base, ui::StyleType::Title),
        table,
        ui::style_text(
            &format!("As of {} from {}", resolved.table.date, resolved.tier),
            ui::StyleType::Subtle
        )
    )
}

pub async fn run(
    rates: &RateProvider,
    storage: &Storage,
    base_currency: &str,
    refresh: bool,
    all: bool,
) -> Result<()> {
    let codes: Vec<String> = if all {
        CURRENCIES.iter().map(|c| c.code.to_string()).collect()
    } else {
        Watchlist::load(storage).await.codes().to_vec()
    };

    let spinner = ui::new_spinner(if refresh {
        "Refreshing exchange rates..."
    } else {
        "Fetching exchange rates..."
    });
    let resolved = if refresh {
        rates.refresh(base_currency).await
    } else {
        rates.resolve(base_currency).await
    };
    spinner.finish_and_clear();

    println!("{}", render_rates(&resolved, &codes));
    Ok(())
}
