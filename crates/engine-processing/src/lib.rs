pub mod batch;
pub mod error;
pub mod transform;
pub mod validation;
