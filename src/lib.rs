pub mod actions;
pub mod config;
pub mod diff;
pub mod env;
pub mod error;
pub mod ingest;
pub mod model;
pub mod payload;
pub mod pipeline;
pub mod upload;
