pub mod catalog;
pub mod config;
pub mod errors;
pub mod ingestor;
pub mod models;
pub mod player;
pub mod session;
pub mod sources;
pub mod streaming;
pub mod utils;
