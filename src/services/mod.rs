pub mod metrics;
pub mod registry;
pub mod token_bucket;
