//! Shared utilities

pub mod crypto;
pub mod logging;
pub mod vm_config;
