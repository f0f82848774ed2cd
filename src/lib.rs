//! Backpack - application models over the backpack-orm mapping layer
//!
//! This library crate exposes configuration and models for integration testing.

pub mod config;
pub mod models;
