pub mod config;
pub mod export;
pub mod ingest;
pub mod matching;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod summary;
pub mod util;

pub mod error;
