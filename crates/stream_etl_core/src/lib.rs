//! Shared stream ETL domain primitives.
//!
//! This crate owns event generation, producer accounting, response envelopes,
//! configuration and the data lake key layout. It intentionally excludes AWS
//! SDK and Lambda runtime concerns.

pub mod config;
pub mod contract;
pub mod generator;
pub mod storage_keys;
