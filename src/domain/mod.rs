//! Domain layer types and invariants.

pub mod blog;
pub mod datasets;
pub mod error;
pub mod matrix;
pub mod palette;
pub mod series;
