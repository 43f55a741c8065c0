//! Config composition.

pub mod service;
