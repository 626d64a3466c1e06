pub mod csv;
pub mod error;
pub mod filter;
pub mod memory;
pub mod sled_store;
pub mod store;
