//! CLI command implementations.

pub mod forget;
pub mod listen;
pub mod status;
pub mod trigger;
