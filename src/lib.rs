//! Chart data service for the State of Solana dashboard.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
