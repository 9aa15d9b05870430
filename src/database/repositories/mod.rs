pub mod employee;
pub mod shift;
pub mod staffing;
pub mod swap;
pub mod time_off;

// Re-export all repositories for easy importing
pub use employee::EmployeeRepository;
pub use shift::ShiftRepository;
pub use staffing::StaffingRepository;
pub use swap::SwapRepository;
pub use time_off::TimeOffRepository;
