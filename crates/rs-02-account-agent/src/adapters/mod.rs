//! Adapters for the account agent ports.

pub mod memory_chain;

pub use memory_chain::{InMemoryChain, ScriptedOutcome};
