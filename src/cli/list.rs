use super::{convert::normalize_code, ui};
use crate::core::currency::{self, CURRENCIES, CurrencyDescriptor, CurrencyKind};
use crate::core::storage::Storage;
use crate::core::watchlist::Watchlist;
use anyhow::{Result, bail};
use comfy_table::Cell;

fn kind_label(kind: CurrencyKind) -> &'static str {
    match kind {
        CurrencyKind::Fiat => "fiat",
        CurrencyKind::Crypto => "crypto",
        CurrencyKind::Metal => "metal",
    }
}

pub fn render_descriptors<'a>(descriptors: impl IntoIterator<Item = &'a CurrencyDescriptor>) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Name"),
        ui::header_cell("Symbol"),
        ui::header_cell("Kind"),
    ]);
    for d in descriptors {
        let code = match d.flag {
            Some(flag) => format!("{flag} {}", d.code),
            None => d.code.to_string(),
        };
        table.add_row(vec![
            Cell::new(code),
            Cell::new(d.name),
            Cell::new(d.symbol),
            Cell::new(kind_label(d.kind)),
        ]);
    }
    table.to_string()
}

pub async fn show(storage: &Storage) -> Result<()> {
    let watchlist = Watchlist::load(storage).await;
    if watchlist.codes().is_empty() {
        println!("{}", ui::style_text("No saved currencies", ui::StyleType::Subtle));
        return Ok(());
    }
    let descriptors = watchlist.codes().iter().filter_map(|c| currency::find(c));
    println!("{}", render_descriptors(descriptors));
    Ok(())
}

pub fn available() -> Result<()> {
    println!("{}", render_descriptors(CURRENCIES));
    Ok(())
}

pub async fn add(storage: &Storage, code: &str) -> Result<()> {
    let code = normalize_code(code)?;
    let mut watchlist = Watchlist::load(storage).await;
    if watchlist.add(&code) {
        watchlist.save(storage).await;
        println!("Added {}", ui::style_text(&code, ui::StyleType::Value));
    } else {
        println!("{} is already saved", code);
    }
    Ok(())
}

pub async fn remove(storage: &Storage, code: &str) -> Result<()> {
    let code = normalize_code(code)?;
    let mut watchlist = Watchlist::load(storage).await;
    if watchlist.remove(&code) {
        watchlist.save(storage).await;
        println!("Removed {}", ui::style_text(&code, ui::StyleType::Value));
    } else {
        println!("{} is not saved", code);
    }
    Ok(())
}

pub async fn reorder(storage: &Storage, codes: &[String]) -> Result<()> {
    let mut normalized = Vec::with_capacity(codes.len());
    for code in codes {
        let code = normalize_code(code)?;
        if normalized.contains(&code) {
            bail!("Duplicate currency code: {}", code);
        }
        normalized.push(code);
    }

    let mut watchlist = Watchlist::load(storage).await;
    watchlist.reorder(normalized);
    watchlist.save(storage).await;
    println!("Saved order: {}", watchlist.codes().join(", "));
    Ok(())
}
