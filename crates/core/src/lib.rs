#![forbid(unsafe_code)]

pub mod metrics;
pub mod model;
pub mod selection;
pub mod time;

pub use time::Clock;
