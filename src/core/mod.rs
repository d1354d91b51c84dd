pub mod engine;
pub mod error;
pub mod interval;
pub mod io;
pub mod metrics;
pub mod model;
