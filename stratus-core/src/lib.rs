//! Stratus Core
//!
//! Core library for idempotent cloud resource reconciliation: declare a
//! resource's identity, look it up, create it when absent, and hand back a
//! stable identifier either way.

pub mod config;
pub mod creator;
pub mod descriptor;
pub mod error;
pub mod fanout;
pub mod locator;
pub mod provider;
pub mod reconciler;
