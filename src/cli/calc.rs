use super::{convert, ui};
use crate::core::calculator::{Calculator, KeySequence};
use crate::core::conversion::parse_amount;
use crate::core::resolver::RateProvider;
use crate::core::storage::Storage;
use anyhow::{Context, Result};

/// Expression and effective value after feeding `keys`, before completion.
pub fn evaluate(keys: &str) -> Result<(Calculator, String, String)> {
    let keys: KeySequence = keys
        .parse()
        .with_context(|| format!("Failed to parse keys: {keys}"))?;
    let mut calculator = Calculator::new();
    calculator.press_all(&keys);
    let expression = calculator.display_expression();
    let effective = calculator.effective_value();
    Ok((calculator, expression, effective))
}

pub async fn run(
    rates: &RateProvider,
    storage: &Storage,
    base_currency: &str,
    from: &str,
    keys: &str,
) -> Result<()> {
    let from = convert::normalize_code(from)?;
    let (mut calculator, expression, effective) = evaluate(keys)?;

    println!(
        "{} {}",
        ui::style_text("Expression:", ui::StyleType::Label),
        expression
    );
    println!(
        "{} {}",
        ui::style_text("Value:", ui::StyleType::Label),
        ui::style_text(&effective, ui::StyleType::Value)
    );

    let value = calculator.complete_pending_calculation();
    match convert::fan_out(rates, storage, base_currency, parse_amount(&value), &from, &[]).await? {
        Some(output) => println!("\n{output}"),
        None => println!(
            "{}",
            ui::style_text("Nothing to convert for a zero amount", ui::StyleType::Subtle)
        ),
    }
    Ok(())
}
