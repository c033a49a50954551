pub mod backtest;
pub mod config;
pub mod ensemble;
pub mod features;
pub mod form_model;
pub mod hawkes;
pub mod http_cache;
pub mod http_client;
pub mod narrative;
pub mod negative_binomial;
pub mod news_fetch;
pub mod outcome;
pub mod pipeline;
pub mod poisson;
pub mod stats_fetch;
pub mod store;
