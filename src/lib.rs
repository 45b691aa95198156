pub mod app;
pub mod cli;
pub mod engine;
pub mod hygiene;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod report;
pub mod settings;
pub mod thresholds;
pub mod utils;

#[cfg(test)]
pub mod test_utils;
