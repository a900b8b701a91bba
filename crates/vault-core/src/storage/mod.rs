//! Storage backends for accounts and secret rows
//!
//! This module provides two storage backends:
//! 1. JSON file in the user's data directory
//! 2. In-memory map (tests, throwaway vaults)

mod file;
mod memory;
mod traits;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use traits::VaultStorage;
