pub mod battery;
pub mod location;
