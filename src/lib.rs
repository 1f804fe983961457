pub mod aggregator;
pub mod config;
pub mod models;
pub mod sensor;
pub mod source;
pub mod utils;
