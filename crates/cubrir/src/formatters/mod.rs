//! Interchange format codecs.

pub mod lcov;

pub use lcov::LcovWriter;
