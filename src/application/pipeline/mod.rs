//! The data pipeline every chart shares: normalise, brush, aggregate, then
//! optionally convert to percentages and rank dimensions for colouring.

pub mod aggregate;
pub mod brush;
pub mod normalize;
pub mod percent;
pub mod ranking;

pub use aggregate::{accumulate, aggregate, aggregate_by, aggregate_records};
pub use brush::{apply_brush, filter_by_brush};
pub use normalize::{DimensionSpec, RawRow, RowSchema, coerce_value, normalize};
pub use percent::to_percent;
pub use ranking::rank_and_color;
