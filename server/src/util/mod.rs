//! Utility modules.

pub mod keys;

pub use keys::{generate_project_key, is_valid_project_key};
