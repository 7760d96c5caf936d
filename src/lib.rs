//! Alpha League idea service library
//!
//! Access and lifecycle rules for trade ideas, the stores behind them and the
//! HTTP surface that exposes them.

pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod persistence;
pub mod rate_limit;
pub mod secrets;
pub mod seed;
