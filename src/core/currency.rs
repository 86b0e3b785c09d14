//! Currency reference data.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CurrencyKind {
    Fiat,
    Crypto,
    Metal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrencyDescriptor {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
    /// Flag emoji for fiat currencies; display-only.
    pub flag: Option<&'static str>,
    pub kind: CurrencyKind,
}

const fn fiat(
    code: &'static str,
    name: &'static str,
    symbol: &'static str,
    flag: &'static str,
) -> CurrencyDescriptor {
    CurrencyDescriptor {
        code,
        name,
        symbol,
        flag: Some(flag),
        kind: CurrencyKind::Fiat,
    }
}

pub const CURRENCIES: &[CurrencyDescriptor] = &[
    fiat("USD", "Dollar", "$", "🇺🇸"),
    fiat("EUR", "Euro", "€", "🇪🇺"),
    fiat("GBP", "Pound", "£", "🇬🇧"),
    fiat("JPY", "Yen", "¥", "🇯🇵"),
    fiat("CNY", "Yuan", "¥", "🇨🇳"),
    fiat("INR", "Rupee", "₹", "🇮🇳"),
    fiat("AED", "Dirham", "د.إ", "🇦🇪"),
    fiat("AUD", "Dollar", "$", "🇦🇺"),
    fiat("CAD", "Dollar", "$", "🇨🇦"),
    fiat("CHF", "Franc", "Fr", "🇨🇭"),
    fiat("SEK", "Krona", "kr", "🇸🇪"),
    fiat("NZD", "Dollar", "$", "🇳🇿"),
    fiat("SGD", "Dollar", "$", "🇸🇬"),
    fiat("HKD", "Dollar", "$", "🇭🇰"),
    fiat("NOK", "Krone", "kr", "🇳🇴"),
    fiat("MXN", "Peso", "$", "🇲🇽"),
    fiat("ZAR", "Rand", "R", "🇿🇦"),
    fiat("BRL", "Real", "R$", "🇧🇷"),
    fiat("RUB", "Ruble", "₽", "🇷🇺"),
    fiat("KRW", "Won", "₩", "🇰🇷"),
    fiat("THB", "Baht", "฿", "🇹🇭"),
    fiat("IDR", "Rupiah", "Rp", "🇮🇩"),
    fiat("MYR", "Ringgit", "RM", "🇲🇾"),
    fiat("PHP", "Peso", "₱", "🇵🇭"),
    fiat("PKR", "Rupee", "₨", "🇵🇰"),
    fiat("EGP", "Pound", "£", "🇪🇬"),
    fiat("VND", "Dong", "₫", "🇻🇳"),
    fiat("BDT", "Taka", "৳", "🇧🇩"),
    fiat("PLN", "Zloty", "zł", "🇵🇱"),
    fiat("QAR", "Riyal", "ر.ق", "🇶🇦"),
    fiat("SAR", "Riyal", "ر.س", "🇸🇦"),
    fiat("KWD", "Dinar", "د.ك", "🇰🇼"),
    fiat("BHD", "Dinar", "د.ب", "🇧🇭"),
    fiat("OMR", "Rial", "ر.ع", "🇴🇲"),
    CurrencyDescriptor {
        code: "BTC",
        name: "Bitcoin",
        symbol: "₿",
        flag: None,
        kind: CurrencyKind::Crypto,
    },
    CurrencyDescriptor {
        code: "XAU",
        name: "Gold (oz)",
        symbol: "Au",
        flag: None,
        kind: CurrencyKind::Metal,
    },
    CurrencyDescriptor {
        code: "XAG",
        name: "Silver (oz)",
        symbol: "Ag",
        flag: None,
        kind: CurrencyKind::Metal,
    },
];

/// Shown when no saved list exists yet.
pub const DEFAULT_CURRENCY_CODES: &[&str] = &["USD", "INR", "AED"];

pub fn find(code: &str) -> Option<&'static CurrencyDescriptor> {
    CURRENCIES
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(code))
}

pub fn is_known(code: &str) -> bool {
    find(code).is_some()
}
