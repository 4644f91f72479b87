//! The capture→segment→recognize pipeline and its lifecycle.

pub mod accumulator;
pub mod controller;
pub mod sink;
pub mod state;
pub mod types;
pub mod worker;
