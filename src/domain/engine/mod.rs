pub mod aggregation;
pub mod query_engine;
