pub mod employee;
pub mod macros;
pub mod shift;
pub mod staffing;
pub mod swap;
pub mod time_off;

// Re-export all models for easy importing
pub use employee::*;
pub use shift::*;
pub use staffing::*;
pub use swap::*;
pub use time_off::*;
