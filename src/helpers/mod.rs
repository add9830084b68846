//! Helper functions for presenting content

mod date;

pub use date::*;
