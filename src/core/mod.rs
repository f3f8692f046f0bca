//! Core domain types and cross-cutting infrastructure.

pub mod clock;
pub mod identity;
pub mod logging;
pub mod models;
