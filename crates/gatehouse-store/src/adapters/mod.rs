//! Adapters implementing the storage ports.

pub mod memory;

pub use memory::MemoryBackend;
