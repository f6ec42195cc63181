pub mod congestion;
pub mod emergency;

pub use congestion::{classify, count_vehicles};
pub use emergency::{emergency_detected, is_inert};
