//! Gateway implementations

mod accelerated;
mod builder;
pub mod stream;

pub use accelerated::AcceleratedGateway;
pub use builder::{Hermod, HermodBuilder};
