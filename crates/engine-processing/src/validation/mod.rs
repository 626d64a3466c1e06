pub mod engine;
pub mod result;
pub mod rules;
