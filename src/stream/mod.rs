//! Stream combinators for session outputs

mod throttle;

pub use throttle::{Throttle, ThrottleExt};
