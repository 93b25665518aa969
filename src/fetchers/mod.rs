pub mod base;
pub mod coinmarketcap;
pub mod perigon;
