//! Command implementations

pub mod hash_inputs;
pub mod init;
