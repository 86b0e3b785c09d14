pub mod calc;
pub mod convert;
pub mod list;
pub mod rates;
pub mod setup;
pub mod ui;
