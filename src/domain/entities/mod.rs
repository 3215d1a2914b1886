pub mod dataset;
pub mod enrollment;
pub mod query;
pub mod summary;
