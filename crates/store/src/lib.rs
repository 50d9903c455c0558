//! Index store implementations for strata.

pub mod noop;
pub mod in_memory;
pub mod file_backend;

pub use noop::NoopStore;
pub use in_memory::InMemoryStore;
pub use file_backend::FileStore;
