//! User store adapters
//!
//! Implementations of [`auth::UserStore`]:
//! - [`InMemoryUserStore`] keeps records in process memory
//! - [`FileUserStore`] persists them to a JSON document on disk
//!
//! Both enforce email uniqueness and apply conditional updates atomically
//! under a single write lock.

mod directory;
pub mod file;
pub mod memory;

pub use file::FileUserStore;
pub use memory::InMemoryUserStore;
