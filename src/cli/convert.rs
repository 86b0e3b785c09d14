use super::ui;
use crate::core::conversion::{Conversion, convert_all, format_amount, parse_amount};
use crate::core::currency;
use crate::core::resolver::{RateProvider, Resolved};
use crate::core::storage::Storage;
use crate::core::watchlist::{LastConversion, Watchlist};
use anyhow::{Result, bail};
use comfy_table::Cell;

/// Upper-cases `code` and checks it against the known currencies.
pub fn normalize_code(code: &str) -> Result<String> {
    match currency::find(code.trim()) {
        Some(descriptor) => Ok(descriptor.code.to_string()),
        None => bail!("Unknown currency code: {}", code),
    }
}

pub fn render_conversions(conversions: &[Conversion], source: &str, resolved: &Resolved) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Name"),
        ui::header_cell("Amount"),
    ]);

    for conversion in conversions {
        let descriptor = currency::find(&conversion.code);
        let label = match descriptor.and_then(|d| d.flag) {
            Some(flag) => format!("{flag} {}", conversion.code),
            None => conversion.code.clone(),
        };
        let amount = match descriptor {
            Some(d) => format!("{} {}", d.symbol, format_amount(conversion.amount)),
            None => format_amount(conversion.amount),
        };
        table.add_row(vec![
            Cell::new(label),
            Cell::new(descriptor.map_or("", |d| d.name)),
            ui::amount_cell(amount, conversion.code == source),
        ]);
    }

    let mut output = table.to_string();
    output.push_str(&format!(
        "\n{}",
        ui::style_text(
            &format!(
                "Rates as of {} (base {}, from {})",
                resolved.table.date, resolved.table.base, resolved.tier
            ),
            ui::StyleType::Subtle
        )
    ));
    output
}

/// Resolves rates, fans `amount` out and persists the result as the last
/// conversion.
pub async fn fan_out(
    rates: &RateProvider,
    storage: &Storage,
    base_currency: &str,
    amount: f64,
    from: &str,
    targets: &[String],
) -> Result<Option<String>> {
    let codes = if targets.is_empty() {
        Watchlist::load(storage).await.codes().to_vec()
    } else {
        targets
            .iter()
            .map(|c| normalize_code(c))
            .collect::<Result<Vec<_>>>()?
    };

    let spinner = ui::new_spinner("Fetching exchange rates...");
    let resolved = rates.resolve(base_currency).await;
    spinner.finish_and_clear();

    let conversions = convert_all(amount, from, &codes, &resolved.table);
    if conversions.is_empty() {
        return Ok(None);
    }

    LastConversion::new(from, amount, &conversions)
        .save(storage)
        .await;
    Ok(Some(render_conversions(&conversions, from, &resolved)))
}

pub async fn run(
    rates: &RateProvider,
    storage: &Storage,
    base_currency: &str,
    amount: &str,
    from: &str,
    targets: &[String],
) -> Result<()> {
    let from = normalize_code(from)?;
    let value = parse_amount(amount);

    match fan_out(rates, storage, base_currency, value, &from, targets).await? {
        Some(output) => println!("{output}"),
        None => println!(
            "{}",
            ui::style_text("Nothing to convert for a zero amount", ui::StyleType::Subtle)
        ),
    }
    Ok(())
}

pub async fn show_last(storage: &Storage) -> Result<()> {
    let Some(last) = LastConversion::load(storage).await else {
        println!(
            "{}",
            ui::style_text("No conversion saved yet", ui::StyleType::Subtle)
        );
        return Ok(());
    };

    println!(
        "Last conversion: {} {}\n",
        ui::style_text(&format_amount(last.base.amount), ui::StyleType::Value),
        ui::style_text(&last.base.currency, ui::StyleType::Label)
    );

    let mut codes: Vec<&String> = last.conversions.keys().collect();
    codes.sort();

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Currency"), ui::header_cell("Amount")]);
    for code in codes {
        table.add_row(vec![
            Cell::new(code),
            ui::format_optional_cell(last.conversions.get(code).copied(), format_amount),
        ]);
    }
    println!("{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rates::ExchangeRateTable;
    use crate::core::resolver::Tier;
    use std::collections::HashMap;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("eur").unwrap(), "EUR");
        assert_eq!(normalize_code(" btc ").unwrap(), "BTC");
        assert_eq!(
            normalize_code("ABC").unwrap_err().to_string(),
            "Unknown currency code: ABC"
        );
    }

    #[test]
    fn test_render_conversions() {
        let resolved = Resolved {
            table: ExchangeRateTable::new(
                "USD",
                "2024-03-01",
                HashMap::from([("EUR".to_string(), 0.85)]),
            ),
            tier: Tier::StaleCache,
        };
        let conversions = vec![
            Conversion {
                code: "EUR".to_string(),
                amount: 100.0,
            },
            Conversion {
                code: "USD".to_string(),
                amount: 117.64705882,
            },
        ];

        let output = render_conversions(&conversions, "EUR", &resolved);
        assert!(output.contains("EUR"));
        assert!(output.contains("€ 100.0000"));
        assert!(output.contains("$ 117.6471"));
        assert!(output.contains("2024-03-01"));
        assert!(output.contains("stale cache"));
    }
}
