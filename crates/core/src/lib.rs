//! Hireflow Core
//!
//! Domain logic for the HR console: the scripted voice interview and the
//! in-memory directory with its keyword chat assistant. Speech is reached
//! only through the ports in [`speech`], so every piece here runs the same
//! against terminal adapters, scripted doubles or mocks.

pub mod assistant;
pub mod directory;
pub mod script;
pub mod session;
pub mod speech;
pub mod transcript;
