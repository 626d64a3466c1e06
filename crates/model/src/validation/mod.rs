pub mod severity;
