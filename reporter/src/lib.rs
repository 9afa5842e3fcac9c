pub mod agent;
pub mod battery;
pub mod config;
pub mod error;
pub mod identity;
pub mod location;
pub mod notice;
