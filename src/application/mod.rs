//! Application services: the chart pipeline, upstream fetching and the
//! blob-backed admin and blog services.

pub mod admin_data;
pub mod blog;
pub mod brush_session;
pub mod catalog;
pub mod charts;
pub mod error;
pub mod latest;
pub mod pipeline;
pub mod repos;
pub mod sources;
pub mod throttle;
