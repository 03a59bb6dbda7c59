pub mod auth;
pub mod client;
pub mod daily_cash;
pub mod metrics;
pub mod product;
pub mod sale;
pub mod supplier;
