pub mod data;
pub mod http;
pub mod json;
