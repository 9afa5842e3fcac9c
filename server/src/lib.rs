pub mod data;
pub mod geo;
pub mod repo;
