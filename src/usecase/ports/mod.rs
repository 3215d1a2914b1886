pub mod repo;
pub mod source;
