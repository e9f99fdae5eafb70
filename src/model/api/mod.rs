//! API-compatible types.
//!
//! The types in this module make up request and response bodies, plus the
//! pure functions that operate on them (roster parsing, ballot
//! validation, vote tallying).

pub mod auth;
pub mod ballot;
pub mod candidate;
pub mod info;
pub mod results;
pub mod voter;
