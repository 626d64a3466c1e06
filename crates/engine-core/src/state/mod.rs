pub mod models;
pub mod snapshot_store;
