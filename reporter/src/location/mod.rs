pub mod base;
pub mod replay;
pub mod simulated;

pub use base::{Accuracy, LocationProvider, LocationRequest, Permission};
pub use replay::ReplayProvider;
pub use simulated::SimulatedProvider;
