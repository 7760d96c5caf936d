pub mod price;
pub mod trade_levels;
