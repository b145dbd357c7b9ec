pub mod place;
pub mod throttle;
pub mod time_serde;
