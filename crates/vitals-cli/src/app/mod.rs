//! Application-level utilities for the Vitals CLI.
//!
//! This module provides:
//! - Path resolution for the config and store files
//! - Username and password prompts
//! - The context that wires vault, key manager, store and session together

mod context;
mod credentials;
mod resolver;

pub use context::AppContext;
pub use credentials::{prompt_new_password, prompt_username};
