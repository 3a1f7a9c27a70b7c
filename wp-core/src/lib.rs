pub mod command_stream;
pub mod error;
pub mod file_system;
pub mod output_macros;
pub mod secrets;
pub mod validation;

// Re-exported for the output macros
pub use colored;
