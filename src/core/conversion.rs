//! Pure currency conversion over an [`ExchangeRateTable`].

use crate::core::calculator::parse_operand;
use crate::core::rates::ExchangeRateTable;
use serde::{Deserialize, Serialize};

/// Converts `amount` of `from` into `to`.
///
/// Missing, zero or non-finite rates count as `1`, so a code the table
/// cannot price passes the amount through instead of failing the fan-out.
pub fn convert(amount: f64, from: &str, to: &str, table: &ExchangeRateTable) -> f64 {
    if from == to {
        return amount;
    }

    let from_rate = table.rate_or_unit(from);
    let to_rate = table.rate_or_unit(to);

    if table.base == from {
        amount * to_rate
    } else if table.base == to {
        amount / from_rate
    } else {
        let base_amount = amount / from_rate;
        base_amount * to_rate
    }
}

/// Display precision by magnitude: 2 decimals from 1000, 4 from 1, else 6.
pub fn format_amount(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1000.0 {
        format!("{value:.2}")
    } else if magnitude >= 1.0 {
        format!("{value:.4}")
    } else {
        format!("{value:.6}")
    }
}

/// Parses user-entered or calculator text, treating anything unparsable as `0`.
pub fn parse_amount(text: &str) -> f64 {
    parse_operand(text)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub code: String,
    pub amount: f64,
}

/// Fans `amount` of `from` out to every code in `codes`.
///
/// The source currency comes first with the amount unchanged, then the
/// remaining codes in list order. A zero amount produces nothing.
pub fn convert_all(
    amount: f64,
    from: &str,
    codes: &[String],
    table: &ExchangeRateTable,
) -> Vec<Conversion> {
    if amount == 0.0 {
        return Vec::new();
    }

    let mut conversions = vec![Conversion {
        code: from.to_string(),
        amount,
    }];
    conversions.extend(
        codes
            .iter()
            .filter(|code| code.as_str() != from)
            .map(|code| Conversion {
                code: code.clone(),
                amount: convert(amount, from, code, table),
            }),
    );
    conversions
}
