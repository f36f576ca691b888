//! Invoice history backends.
//!
//! The core only requires an append path ([`tallybot_core::HistoryStore`]);
//! both backends here expose a read path as well for diagnostics and tests.

mod file;
mod in_memory;

pub use file::FileHistory;
pub use in_memory::InMemoryHistory;
