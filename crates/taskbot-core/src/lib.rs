//! # taskbot-core
//!
//! Core types, traits, configuration, error handling, and text
//! normalization shared by every taskbot crate.

pub mod config;
pub mod error;
pub mod message;
pub mod normalize;
pub mod task;
pub mod traits;
