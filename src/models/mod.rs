pub mod appointment;
pub mod appointment_type;
pub mod session;
pub mod status;
