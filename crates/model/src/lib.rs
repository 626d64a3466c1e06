pub mod core;
pub mod records;
pub mod run;
pub mod validation;
