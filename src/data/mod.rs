//! Data layer - Static tables
//!
//! This module contains the static data the parser consults:
//! - Structural keywords and opaque environment names
//! - Argument signatures of common commands and environments

pub mod constants;
pub mod signatures;

// Re-export commonly used items
pub use constants::{is_skip_env, PUNCTUATION_COMMANDS, SKIP_ENVS};
pub use signatures::{command_signature, environment_signature, Signature};
