mod memory;
mod sql;

pub use memory::InMemoryStore;
pub use sql::SqlStore;
