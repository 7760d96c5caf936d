pub mod account;
pub mod idea;
pub mod market;
pub mod principal;
pub mod trader;
