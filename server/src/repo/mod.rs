pub mod database;
pub mod handlers;
pub mod http;
