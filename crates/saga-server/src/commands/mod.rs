//! Command implementations for the `saga` binary.

pub mod keygen;
pub mod mcp;
pub mod serve;
pub mod tools;
