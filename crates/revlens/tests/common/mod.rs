//! Shared test utilities for revlens integration tests.
//!
//! This module provides:
//! - Builders for classified items, job records and monitor configs
//! - Scripted fake transports that record how often they were called

pub mod builders;
pub mod fakes;

pub use builders::*;
pub use fakes::{FakeBackend, PushScript, ScriptedPush};
