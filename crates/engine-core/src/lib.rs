pub mod config;
pub mod error;
pub mod profiler;
pub mod retry;
pub mod state;
