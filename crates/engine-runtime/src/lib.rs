pub mod error;
pub mod mapped;
pub mod rollback;
pub mod runner;
pub mod transformer;
