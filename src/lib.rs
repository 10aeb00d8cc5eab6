pub mod api;
pub mod builder;
pub mod clients;
pub mod config;
pub mod dispatcher;
pub mod drainer;
pub mod error;
pub mod models;
pub mod utils;
