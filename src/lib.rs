//! Read-heavy item listing service over Postgres, with an in-memory
//! response cache and a built-in load generator for measuring the
//! cached and uncached paths side by side.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
