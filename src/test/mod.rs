//! Shared test support: class file factories and analysis helpers.

pub mod factories;
pub mod helpers;
