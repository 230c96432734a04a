//! High-level operations.
//!
//! This module contains the implementation of Wharf commands.

pub mod hash_inputs;
pub mod init;

pub use hash_inputs::hash_inputs;
pub use init::{init, InitBackend, InitOptions};
