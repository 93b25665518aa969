pub mod news;
pub mod portfolio;
pub mod quote;
