//! # uxprobe-core
//!
//! Core types for uxprobe page verification.
//!
//! A [`VerificationRun`] targets one page: navigate, evaluate an ordered list of
//! [`Step`]s, screenshot the result. Steps are bounded-wait assertions on the
//! page ([`AssertionStep`]) or on files the application writes
//! ([`FileAssertion`]), and interactions ([`Interaction`]). The first failing
//! step ends the run.

pub mod config;
mod error;
pub mod fail_open;
pub mod fixture;
mod types;

pub use config::ProbeConfig;
pub use error::{ProbeError, Result};
pub use fixture::{ActivityLogFixture, LogEntry, LogLevel};
pub use types::*;
