pub mod auth;
pub mod employees;
pub mod schedules;
pub mod shared;
pub mod shifts;
pub mod staffing;
pub mod swaps;
pub mod system;
pub mod time_off;
