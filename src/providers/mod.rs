pub mod coinbase;
pub mod fiat;
pub mod metals;
pub mod util;

pub use coinbase::CoinbaseCryptoSource;
pub use fiat::FiatRateSource;
pub use metals::StaticMetalsSource;
