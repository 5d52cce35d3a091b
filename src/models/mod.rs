pub mod decimal;
mod price_record;
mod price_table;
mod stats;

pub use price_record::{normalize_price, price_from_f64, PriceRecord, PRICE_SCALE};
pub use price_table::{MergeSummary, PriceTable};
pub use stats::PriceStats;
